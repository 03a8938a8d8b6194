use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor};

/// Local File Header signature (`PK\x03\x04`)
pub const LOCAL_HEADER_SIGNATURE: u32 = 0x04034b50;
/// Central Directory File Header signature (`PK\x01\x02`)
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x02014b50;
/// End of Central Directory signature (`PK\x05\x06`)
pub const EOCD_SIGNATURE: u32 = 0x06054b50;
/// Central Directory digital signature (`PK\x05\x05`)
pub const DIGITAL_SIGNATURE: u32 = 0x05054b50;
/// Archive Extra Data record signature (`PK\x06\x07`)
pub const ARCHIVE_EXTRA_DATA_SIGNATURE: u32 = 0x07064b50;
/// ZIP64 End of Central Directory signature (`PK\x06\x06`)
pub const ZIP64_EOCD_SIGNATURE: u32 = 0x06064b50;

/// Signatures that mark the end of the local entry region.
pub const TERMINATOR_SIGNATURES: [u32; 5] = [
    CENTRAL_HEADER_SIGNATURE,
    EOCD_SIGNATURE,
    DIGITAL_SIGNATURE,
    ARCHIVE_EXTRA_DATA_SIGNATURE,
    ZIP64_EOCD_SIGNATURE,
];

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIZE: usize = 30;

/// General purpose flag: sizes follow the data in a data descriptor
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x08;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unsupported(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unsupported(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unsupported(v) => *v,
        }
    }

    /// Short label for listings
    pub fn label(&self) -> String {
        match self {
            CompressionMethod::Stored => "Stored".to_string(),
            CompressionMethod::Deflate => "Defl".to_string(),
            CompressionMethod::Unsupported(v) => format!("#{}", v),
        }
    }
}

/// The fixed 30-byte portion of a local file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub signature: u32,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    /// Parse the fixed header fields. The signature is not checked here.
    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        let mut cursor = Cursor::new(data);

        Ok(Self {
            signature: cursor.read_u32::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            compression_method: cursor.read_u16::<LittleEndian>()?,
            last_mod_time: cursor.read_u16::<LittleEndian>()?,
            last_mod_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_field_length: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

/// Metadata of one entry, decoded from its local file header.
///
/// Produced fresh on every advance of the cursor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    pub name: String,
    /// Name exactly as stored, `file_name_length` bytes
    pub raw_name: Vec<u8>,
    pub compression_method: CompressionMethod,
    pub flags: u16,
    /// Only meaningful when the data descriptor flag is clear
    pub declared_compressed_size: u64,
    /// Only meaningful when the data descriptor flag is clear
    pub declared_uncompressed_size: u64,
    pub crc32: u32,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub header_offset: u64,
    pub data_offset: u64,
}

impl EntryMetadata {
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Sizes are unknown until the data has been consumed
    pub fn sizes_deferred(&self) -> bool {
        self.has_data_descriptor() && self.declared_compressed_size == 0
    }

    /// Directory entries end with a path separator
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/') || self.name.ends_with('\\')
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}
