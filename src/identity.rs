//! Durable device identity.
//!
//! The backend hands out a single integer id at registration time.  It is
//! persisted twice so that either store alone can bring the device back
//! with the same identity after a reboot:
//!
//! ```text
//!  region (NVS blob, 8 bytes)          file (flash filesystem)
//!  ┌──────────────┬──────────────┐     ┌──────────────┐
//!  │ marker (u32) │ id (i32, LE) │     │ "<id>\n"     │
//!  │  offset 0    │  offset 4    │     └──────────────┘
//!  └──────────────┴──────────────┘
//! ```
//!
//! The region copy wins whenever its marker matches and it holds a valid
//! id; otherwise the file copy is consulted.  The two stores are written
//! independently with no rollback: a failure on one side leaves the other
//! in place and the next successful save heals the pair.

use core::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{FileStore, RegionStore};
use crate::error::{Error, StorageError};

/// Marker written alongside the id so an erased or foreign region is
/// never mistaken for a stored identity ("MBOX").
pub const REGION_MARKER: u32 = 0x4D42_4F58;
/// Byte offset of the marker inside the region.
pub const MARKER_OFFSET: usize = 0;
/// Byte offset of the identity inside the region.
pub const ID_OFFSET: usize = 4;
/// Number of region bytes owned by the identity layout.
pub const REGION_LEN: usize = 8;
/// On-disk representation of "no identity".
pub const UNSET_SENTINEL: i32 = -1;

// ───────────────────────────────────────────────────────────────
// DeviceId
// ───────────────────────────────────────────────────────────────

/// Backend-assigned device identity.  Always in `0..=i32::MAX` so it fits
/// the signed region slot without colliding with [`UNSET_SENTINEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Validate a raw integer.  Negative or oversized values are not ids.
    pub fn from_raw(raw: i64) -> Option<Self> {
        if (0..=i64::from(i32::MAX)).contains(&raw) {
            Some(Self(raw as u32))
        } else {
            None
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn to_region_bytes(self) -> [u8; 4] {
        (self.0 as i32).to_le_bytes()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// IdentityStore
// ───────────────────────────────────────────────────────────────

/// Redundant identity persistence over a byte region and a flat file.
pub struct IdentityStore<R, F> {
    region: R,
    file: F,
}

impl<R: RegionStore, F: FileStore> IdentityStore<R, F> {
    pub fn new(region: R, file: F) -> Self {
        Self { region, file }
    }

    /// Load the identity, region first, file second.
    ///
    /// Never fails: every storage problem degrades to `None`, which sends
    /// the device down the registration path.
    pub fn load(&self) -> Option<DeviceId> {
        match self.load_region() {
            Ok(Some(id)) => {
                info!("Identity: loaded {} from region", id);
                return Some(id);
            }
            Ok(None) => debug!("Identity: region holds no identity"),
            Err(e) => warn!("Identity: region read failed ({}), trying file", e),
        }

        match self.load_file() {
            Ok(Some(id)) => {
                info!("Identity: loaded {} from file", id);
                Some(id)
            }
            Ok(None) => {
                info!("Identity: none stored, registration required");
                None
            }
            Err(e) => {
                warn!("Identity: file read failed ({}), identity unset", e);
                None
            }
        }
    }

    /// Persist `id` to the region, then to the file.
    ///
    /// Both writes are always attempted.  The first error is returned.
    pub fn save(&mut self, id: DeviceId) -> Result<(), Error> {
        let region = self.save_region(id);
        if let Err(e) = region {
            warn!("Identity: region write failed ({})", e);
        }

        let file = self.save_file(id);
        if let Err(e) = file {
            warn!("Identity: file write failed ({})", e);
        }

        if region.is_ok() && file.is_ok() {
            info!("Identity: saved {} to region and file", id);
        }
        region.and(file).map_err(Error::from)
    }

    fn load_region(&self) -> Result<Option<DeviceId>, StorageError> {
        let mut buf = [0u8; REGION_LEN];
        self.region.read(0, &mut buf)?;

        let marker = u32::from_le_bytes([
            buf[MARKER_OFFSET],
            buf[MARKER_OFFSET + 1],
            buf[MARKER_OFFSET + 2],
            buf[MARKER_OFFSET + 3],
        ]);
        if marker != REGION_MARKER {
            return Ok(None);
        }

        let raw = i32::from_le_bytes([
            buf[ID_OFFSET],
            buf[ID_OFFSET + 1],
            buf[ID_OFFSET + 2],
            buf[ID_OFFSET + 3],
        ]);
        Ok(DeviceId::from_raw(i64::from(raw)))
    }

    fn load_file(&self) -> Result<Option<DeviceId>, StorageError> {
        let contents = match self.file.read_to_string() {
            Ok(c) => c,
            Err(StorageError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(parse_file_contents(&contents))
    }

    fn save_region(&mut self, id: DeviceId) -> Result<(), StorageError> {
        self.region
            .write(MARKER_OFFSET, &REGION_MARKER.to_le_bytes())?;
        self.region.write(ID_OFFSET, &id.to_region_bytes())?;
        self.region.commit()
    }

    fn save_file(&mut self, id: DeviceId) -> Result<(), StorageError> {
        use core::fmt::Write;
        let mut line = heapless::String::<16>::new();
        // An i32 plus newline is at most 12 bytes.
        let _ = writeln!(line, "{}", id);
        self.file.write_all(&line)
    }

    /// Borrow the region backend (diagnostics and tests).
    pub fn region(&self) -> &R {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut R {
        &mut self.region
    }

    /// Borrow the file backend (diagnostics and tests).
    pub fn file(&self) -> &F {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut F {
        &mut self.file
    }
}

/// Parse the newline-terminated decimal file format.  Anything that is not
/// a valid id (including the `-1` sentinel) reads as "unset".
fn parse_file_contents(contents: &str) -> Option<DeviceId> {
    let line = contents.lines().next()?.trim();
    line.parse::<i64>().ok().and_then(DeviceId::from_raw)
}
