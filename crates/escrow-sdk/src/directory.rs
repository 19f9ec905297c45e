use escrow_crypto::{AddressDeriver, DeriveError};
use escrow_types::{AddressRef, Bump, Identity};

/// The single escrow slot an initializer owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EscrowSlot {
    pub initializer: Identity,
    pub address: AddressRef,
    pub bump: Bump,
}

/// Keyed map from initializer identity to its one canonical escrow slot.
///
/// The map is total and computed, not stored: every identity has exactly
/// one slot and two identities never share one. This is what limits each
/// initializer to a single active escrow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscrowDirectory {
    deriver: AddressDeriver,
}

impl EscrowDirectory {
    pub fn new(deriver: AddressDeriver) -> Self {
        Self { deriver }
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// Slot owned by `initializer`.
    pub fn slot(&self, initializer: &Identity) -> Result<EscrowSlot, DeriveError> {
        let (address, bump) = self.deriver.derive_identity(initializer)?;
        Ok(EscrowSlot {
            initializer: *initializer,
            address,
            bump,
        })
    }

    /// Address of the slot owned by `initializer`.
    pub fn address_of(&self, initializer: &Identity) -> Result<AddressRef, DeriveError> {
        self.slot(initializer).map(|slot| slot.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_identity_has_one_stable_slot() {
        let directory = EscrowDirectory::default();
        let id = Identity::from_bytes([4; 32]);
        let first = directory.slot(&id).unwrap();
        let second = directory.slot(&id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.initializer, id);
        assert!(directory.deriver().verify(&id, &first.address, first.bump));
    }

    #[test]
    fn distinct_identities_never_share_a_slot() {
        let directory = EscrowDirectory::default();
        let a = directory.address_of(&Identity::from_bytes([1; 32])).unwrap();
        let b = directory.address_of(&Identity::from_bytes([2; 32])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn label_partitions_the_directory() {
        let id = Identity::from_bytes([9; 32]);
        let default = EscrowDirectory::default();
        let other = EscrowDirectory::new(
            AddressDeriver::new(*default.deriver().program_id(), "escrow-v2").unwrap(),
        );
        assert_ne!(
            default.address_of(&id).unwrap(),
            other.address_of(&id).unwrap()
        );
    }
}
