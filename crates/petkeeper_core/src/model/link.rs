//! Ownership link mutation.
//!
//! # Responsibility
//! - Be the only code path that changes `Owner::pets` or `Pet::owners`.
//!
//! # Invariants
//! - `link`/`unlink` always update both adjacency sets in one call, so
//!   `pet ∈ owner.pets ⟺ owner ∈ pet.owners` holds after every mutation.

use crate::model::owner::Owner;
use crate::model::pet::Pet;

/// Returns whether the owner/pet link exists on either side.
pub fn is_linked(owner: &Owner, pet: &Pet) -> bool {
    owner.owns(pet.uuid) || pet.is_owned_by(owner.uuid)
}

/// Links `owner` and `pet` on both sides.
///
/// Returns `false` when the link already existed.
pub fn link(owner: &mut Owner, pet: &mut Pet) -> bool {
    let added_to_owner = owner.pets.insert(pet.uuid);
    let added_to_pet = pet.owners.insert(owner.uuid);
    added_to_owner || added_to_pet
}

/// Removes the `owner`/`pet` link from both sides.
///
/// Returns `false` when there was nothing to remove.
pub fn unlink(owner: &mut Owner, pet: &mut Pet) -> bool {
    let removed_from_owner = owner.pets.remove(&pet.uuid);
    let removed_from_pet = pet.owners.remove(&owner.uuid);
    removed_from_owner || removed_from_pet
}

#[cfg(test)]
mod tests {
    use super::{is_linked, link, unlink};
    use crate::model::address::{Address, AddressDraft};
    use crate::model::owner::{Gender, Identity, Owner};
    use crate::model::pet::Pet;

    fn owner() -> Owner {
        Owner::new(
            Identity::new("Doe", "Jane").unwrap(),
            Address::from_draft(AddressDraft::new("Paris", "rue", "Lepic", "1")),
            30,
            Gender::Female,
        )
        .unwrap()
    }

    #[test]
    fn link_and_unlink_keep_both_sides_in_step() {
        let mut owner = owner();
        let mut pet = Pet::new("Rex", Some(2), "dog").unwrap();

        assert!(link(&mut owner, &mut pet));
        assert!(owner.owns(pet.uuid));
        assert!(pet.is_owned_by(owner.uuid));
        assert!(is_linked(&owner, &pet));

        assert!(!link(&mut owner, &mut pet));
        assert_eq!(owner.pets().len(), 1);
        assert_eq!(pet.owners().len(), 1);

        assert!(unlink(&mut owner, &mut pet));
        assert!(!owner.owns(pet.uuid));
        assert!(!pet.is_owned_by(owner.uuid));
        assert!(!unlink(&mut owner, &mut pet));
    }
}
