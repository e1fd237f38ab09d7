//! Branch table implementation.

use crate::error::{CoreError, Result};
use crate::revisions::RevisionStore;
use crate::types::{Branch, BranchId, RevisionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Name of the branch every document starts with.
pub const MAIN_BRANCH: &str = "main";

/// Trim a requested branch name, rejecting names that are blank.
pub fn normalize_branch_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyBranchName);
    }
    Ok(trimmed)
}

/// All branches of one document, by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchTable {
    branches: BTreeMap<BranchId, Branch>,
}

impl BranchTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding only the main branch at `head`.
    pub fn with_main(head: RevisionId) -> (Self, BranchId) {
        let id = BranchId::generate(&[MAIN_BRANCH, head.as_str()]);
        let mut table = Self::new();
        table.branches.insert(
            id.clone(),
            Branch {
                id: id.clone(),
                name: MAIN_BRANCH.to_string(),
                head_revision_id: head,
            },
        );
        (table, id)
    }

    /// Create a branch named `name` pointing at `from`.
    ///
    /// Names are compared trimmed and case-insensitively.
    pub fn create(
        &mut self,
        name: &str,
        from: &RevisionId,
        revisions: &RevisionStore,
    ) -> Result<&Branch> {
        let name = normalize_branch_name(name)?;

        if self.find_by_name(name).is_some() {
            return Err(CoreError::DuplicateBranchName(name.to_string()));
        }
        if !revisions.contains(from) {
            return Err(CoreError::InvalidRevision(from.clone()));
        }

        let id = BranchId::generate(&[name, from.as_str()]);
        let branch = Branch {
            id: id.clone(),
            name: name.to_string(),
            head_revision_id: from.clone(),
        };

        Ok(self.branches.entry(id).or_insert(branch))
    }

    /// Look up a branch by name, trimmed and case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&Branch> {
        let wanted = name.trim().to_lowercase();
        self.branches
            .values()
            .find(|b| b.name.trim().to_lowercase() == wanted)
    }

    /// Get a branch by id.
    pub fn get(&self, id: &BranchId) -> Option<&Branch> {
        self.branches.get(id)
    }

    pub fn contains(&self, id: &BranchId) -> bool {
        self.branches.contains_key(id)
    }

    /// Move a branch head. The revision must exist.
    pub fn set_head(
        &mut self,
        id: &BranchId,
        head: RevisionId,
        revisions: &RevisionStore,
    ) -> Result<()> {
        if !revisions.contains(&head) {
            return Err(CoreError::InvalidRevision(head));
        }
        let branch = self
            .branches
            .get_mut(id)
            .ok_or_else(|| CoreError::UnknownBranch(id.clone()))?;

        branch.head_revision_id = head;
        Ok(())
    }

    /// Iterate all branches in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Branches whose head is missing from `revisions`.
    pub fn dangling_heads<'a>(
        &'a self,
        revisions: &'a RevisionStore,
    ) -> impl Iterator<Item = &'a Branch> {
        self.branches
            .values()
            .filter(move |b| !revisions.contains(&b.head_revision_id))
    }

    /// Check a deserialized table: every branch is keyed by its own id and
    /// names are non-blank and unique, trimmed and case-insensitively.
    pub fn verify(&self) -> Result<()> {
        let mut names = HashSet::new();
        for (key, branch) in &self.branches {
            if key != &branch.id {
                return Err(CoreError::UnrecognizedSnapshot(format!(
                    "branch stored under {} has id {}",
                    key, branch.id
                )));
            }
            let name = normalize_branch_name(&branch.name)?;
            if !names.insert(name.to_lowercase()) {
                return Err(CoreError::DuplicateBranchName(name.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RevisionInput;

    fn setup() -> (RevisionStore, RevisionId) {
        let mut revisions = RevisionStore::new();
        let root = revisions
            .append(RevisionInput::new(None, "root"))
            .unwrap()
            .id()
            .clone();
        (revisions, root)
    }

    #[test]
    fn test_with_main() {
        let (_, root) = setup();
        let (table, main_id) = BranchTable::with_main(root.clone());

        let main = table.get(&main_id).unwrap();
        assert_eq!(main.name, MAIN_BRANCH);
        assert_eq!(main.head_revision_id, root);
    }

    #[test]
    fn test_create_branch_aliases_revision() {
        let (revisions, root) = setup();
        let (mut table, _) = BranchTable::with_main(root.clone());

        let branch = table.create("  feature  ", &root, &revisions).unwrap();
        assert_eq!(branch.name, "feature");
        assert_eq!(branch.head_revision_id, root);
        assert_eq!(table.len(), 2);
        assert_eq!(revisions.len(), 1);
    }

    #[test]
    fn test_duplicate_name_case_insensitive() {
        let (revisions, root) = setup();
        let (mut table, _) = BranchTable::with_main(root.clone());

        for name in ["Main", " MAIN ", "main"] {
            let result = table.create(name, &root, &revisions);
            assert!(matches!(result, Err(CoreError::DuplicateBranchName(_))), "{}", name);
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let (revisions, root) = setup();
        let (mut table, _) = BranchTable::with_main(root.clone());

        let result = table.create("   ", &root, &revisions);
        assert!(matches!(result, Err(CoreError::EmptyBranchName)));
    }

    #[test]
    fn test_create_from_unknown_revision() {
        let (revisions, root) = setup();
        let (mut table, _) = BranchTable::with_main(root);

        let result = table.create("feature", &RevisionId::from("nope"), &revisions);
        assert!(matches!(result, Err(CoreError::InvalidRevision(_))));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_set_head_validates() {
        let (mut revisions, root) = setup();
        let (mut table, main_id) = BranchTable::with_main(root.clone());

        let next = revisions
            .append(RevisionInput::new(Some(root), "next"))
            .unwrap()
            .id()
            .clone();
        table.set_head(&main_id, next.clone(), &revisions).unwrap();
        assert_eq!(table.get(&main_id).unwrap().head_revision_id, next);

        let bad = table.set_head(&main_id, RevisionId::from("ghost"), &revisions);
        assert!(matches!(bad, Err(CoreError::InvalidRevision(_))));

        let unknown = table.set_head(&BranchId::from("ghost"), next, &revisions);
        assert!(matches!(unknown, Err(CoreError::UnknownBranch(_))));
    }

    #[test]
    fn test_verify_names_and_keys() {
        let (revisions, root) = setup();
        let (mut table, main_id) = BranchTable::with_main(root.clone());
        let feature = table.create("feature", &root, &revisions).unwrap().id.clone();
        table.verify().unwrap();

        let mut shouting = table.clone();
        shouting.branches.get_mut(&feature).unwrap().name = " MAIN ".into();
        assert!(matches!(shouting.verify(), Err(CoreError::DuplicateBranchName(_))));

        let mut blank = table.clone();
        blank.branches.get_mut(&feature).unwrap().name = "  ".into();
        assert!(matches!(blank.verify(), Err(CoreError::EmptyBranchName)));

        let mut rekeyed = table.clone();
        let main = rekeyed.branches.remove(&main_id).unwrap();
        rekeyed.branches.insert(BranchId::from("elsewhere"), main);
        assert!(matches!(rekeyed.verify(), Err(CoreError::UnrecognizedSnapshot(_))));
    }
}
