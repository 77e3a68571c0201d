//! Fixed-width table rows.

use std::fmt;

use crate::common::{Error, Result};

/// Maximum username length in bytes.
pub const USERNAME_MAX_LEN: usize = 32;

/// Maximum email length in bytes.
pub const EMAIL_MAX_LEN: usize = 255;

const ID_SIZE: usize = std::mem::size_of::<u32>();
const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_MAX_LEN;

/// Serialized size of a row in bytes.
///
/// # Layout (291 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     id (little-endian)
/// 4       32    username (UTF-8, NUL-padded)
/// 36      255   email (UTF-8, NUL-padded)
/// ```
pub const ROW_SIZE: usize = EMAIL_OFFSET + EMAIL_MAX_LEN;

/// One table row. `id` is the B-tree key.
///
/// # Example
/// ```
/// use tinytable::Row;
///
/// let row = Row::new(1, "alice", "alice@example.com").unwrap();
/// assert_eq!(row.username(), "alice");
///
/// assert!(Row::new(2, "x".repeat(33), "x@example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: String,
    email: String,
}

impl Row {
    /// Create a row, checking that each string fits its slot.
    ///
    /// # Errors
    /// - `Error::FieldTooLong` if `username` exceeds [`USERNAME_MAX_LEN`] bytes
    ///   or `email` exceeds [`EMAIL_MAX_LEN`] bytes
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let email = email.into();

        check_len("username", &username, USERNAME_MAX_LEN)?;
        check_len("email", &email, EMAIL_MAX_LEN)?;

        Ok(Self {
            id,
            username,
            email,
        })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Write this row into a value slot.
    ///
    /// # Panics
    /// Panics if `dst.len() < ROW_SIZE`.
    pub fn serialize(&self, dst: &mut [u8]) {
        let dst = &mut dst[..ROW_SIZE];
        dst.fill(0);
        dst[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        dst[USERNAME_OFFSET..USERNAME_OFFSET + self.username.len()]
            .copy_from_slice(self.username.as_bytes());
        dst[EMAIL_OFFSET..EMAIL_OFFSET + self.email.len()].copy_from_slice(self.email.as_bytes());
    }

    /// Read a row out of a value slot.
    ///
    /// # Errors
    /// - `Error::Corrupted` if a string field is not valid UTF-8
    ///
    /// # Panics
    /// Panics if `src.len() < ROW_SIZE`.
    pub fn deserialize(src: &[u8]) -> Result<Self> {
        let id = u32::from_le_bytes([
            src[ID_OFFSET],
            src[ID_OFFSET + 1],
            src[ID_OFFSET + 2],
            src[ID_OFFSET + 3],
        ]);
        let username = read_padded("username", &src[USERNAME_OFFSET..EMAIL_OFFSET])?;
        let email = read_padded("email", &src[EMAIL_OFFSET..ROW_SIZE])?;

        Ok(Self {
            id,
            username,
            email,
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(Error::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

fn read_padded(field: &str, bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8(bytes[..end].to_vec())
        .map_err(|_| Error::corrupted(format!("{} is not valid UTF-8", field)))
}
