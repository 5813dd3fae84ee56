//! The mutability protection ladder: `mutable → protected → constant →
//! single`, monotonically non-decreasing per Proxy.

use crate::error::{CellError, Result};
#[cfg(feature = "verbose")]
use log::{debug, warn};

/// One rung of the protection ladder.
///
/// Ordered so that `as u8` gives the levels `0..=3`, and so that the derived
/// `PartialOrd`/`Ord` matches "higher protection level" exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProtectLevel {
    /// 0 — in-place mutation and aliasing both allowed.
    Mutable = 0,
    /// 1 — in-place mutation forbidden; copy-on-write still allowed.
    Protected = 1,
    /// 2 — as `Protected`, plus the binding (not the value) may still be
    /// replaced wholesale by a later assignment.
    Constant = 2,
    /// 3 — forbids copy-on-write as well; neither clone nor detach succeed.
    Single = 3,
}

impl ProtectLevel {
    /// Whether a writable (`raw = false`) typed access is allowed at this
    /// level without first cloning. Only `Mutable` permits it.
    pub fn allows_in_place_write(self) -> bool {
        self == ProtectLevel::Mutable
    }

    /// Whether a raw swap/assign is allowed at this level: fails `E000J`
    /// if either Proxy is at level >= 1.
    pub fn allows_raw_mutation(self) -> bool {
        self == ProtectLevel::Mutable
    }

    /// Whether copy-on-write may mint a replacement Proxy at this level.
    /// Everything except `Single` allows it.
    pub fn allows_copy_on_write(self) -> bool {
        self != ProtectLevel::Single
    }

    /// Escalate towards `target`, refusing to ever go down the ladder
    /// (fails with `E000G` on a downgrade attempt). Escalating to the
    /// same or a higher level is idempotent and always succeeds.
    pub fn escalate(self, target: ProtectLevel) -> Result<ProtectLevel> {
        if target < self {
            #[cfg(feature = "verbose")]
            warn!("refusing to downgrade protection level from {:?} to {:?}", self, target);
            Err(CellError::ProtectionDowngrade)
        } else {
            #[cfg(feature = "verbose")]
            if target > self {
                debug!("escalating protection level from {:?} to {:?}", self, target);
            }
            Ok(target)
        }
    }
}

impl Default for ProtectLevel {
    fn default() -> Self {
        ProtectLevel::Mutable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_refuses_downgrade() {
        // Run with `--features verbose RUST_LOG=warn` to see the refusal logged.
        let _ = env_logger::try_init();
        let constant = ProtectLevel::Constant;
        assert_eq!(
            constant.escalate(ProtectLevel::Protected),
            Err(CellError::ProtectionDowngrade)
        );
    }

    #[test]
    fn escalation_is_idempotent_at_or_above() {
        let protected = ProtectLevel::Protected;
        assert_eq!(protected.escalate(ProtectLevel::Protected), Ok(ProtectLevel::Protected));
        assert_eq!(protected.escalate(ProtectLevel::Single), Ok(ProtectLevel::Single));
    }

    #[test]
    fn only_mutable_allows_in_place_write() {
        assert!(ProtectLevel::Mutable.allows_in_place_write());
        assert!(!ProtectLevel::Protected.allows_in_place_write());
        assert!(!ProtectLevel::Constant.allows_in_place_write());
        assert!(!ProtectLevel::Single.allows_in_place_write());
    }

    #[test]
    fn single_forbids_copy_on_write_only() {
        assert!(ProtectLevel::Constant.allows_copy_on_write());
        assert!(!ProtectLevel::Single.allows_copy_on_write());
    }
}
