use crate::message::ConnectionId;

/// Display name a connection holds until it identifies.
pub const PLACEHOLDER_NAME: &str = "Anonymous";

#[derive(Debug, Clone)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub username: String,
    pub identified: bool,
}

#[derive(Debug)]
pub enum RenameError {
    NameTaken,
    UnknownConnection,
}

/// Membership table of a single room.
///
/// Members are kept in join order so the roster broadcast is deterministic.
/// Usernames are pairwise distinct after every successful identify or rename;
/// callers serialize all mutations, so the check-then-commit inside
/// `identify` and `rename` cannot interleave.
#[derive(Debug, Default)]
pub struct Room {
    members: Vec<Member>,
}

impl Room {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn join(&mut self, connection_id: ConnectionId) {
        self.members.push(Member {
            connection_id,
            username: PLACEHOLDER_NAME.into(),
            identified: false,
        });
    }

    /// Returns whether the connection was present. Safe to call twice.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.connection_id != *connection_id);
        self.members.len() < before
    }

    /// First-time name registration. Commits the first free variant of the
    /// requested name and returns it, or `None` when the connection is
    /// unknown or has already identified.
    pub fn identify(&mut self, connection_id: &ConnectionId, requested: &str) -> Option<String> {
        if self.member(connection_id)?.identified {
            return None;
        }
        let username = self.ensure_unique_name(requested);
        let member = self.member_mut(connection_id)?;
        member.username = username.clone();
        member.identified = true;
        Some(username)
    }

    /// Commits the exact requested name, or fails when a *different* member
    /// holds it. Renaming to one's own current name succeeds.
    pub fn rename(&mut self, connection_id: &ConnectionId, username: &str) -> Result<(), RenameError> {
        if self
            .members
            .iter()
            .any(|m| m.connection_id != *connection_id && m.username == username)
        {
            return Err(RenameError::NameTaken);
        }
        let member = self
            .member_mut(connection_id)
            .ok_or(RenameError::UnknownConnection)?;
        member.username = username.to_string();
        member.identified = true;
        Ok(())
    }

    pub fn username_of(&self, connection_id: &ConnectionId) -> Option<&str> {
        self.member(connection_id).map(|m| m.username.as_str())
    }

    pub fn usernames(&self) -> Vec<String> {
        self.members.iter().map(|m| m.username.clone()).collect()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.connection_id).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_name_taken(&self, username: &str) -> bool {
        self.members.iter().any(|m| m.username == username)
    }

    /// Tests the requested name against the current table; when taken,
    /// appends `1`, `2`, ... until a free variant is found.
    pub fn ensure_unique_name(&self, requested: &str) -> String {
        let mut candidate = requested.to_string();
        let mut counter = 1;
        while self.is_name_taken(&candidate) {
            candidate = format!("{}{}", requested, counter);
            counter += 1;
        }
        candidate
    }

    fn member(&self, connection_id: &ConnectionId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.connection_id == *connection_id)
    }

    fn member_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| m.connection_id == *connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn it_assigns_the_placeholder_until_identified() {
        let mut room = Room::new();
        room.join(1);
        assert_eq!(room.username_of(&1), Some(PLACEHOLDER_NAME));
    }

    #[test]
    fn it_returns_the_requested_name_when_free() {
        let mut room = Room::new();
        room.join(1);
        assert_eq!(room.identify(&1, "bob"), Some("bob".to_string()));
        assert_eq!(room.username_of(&1), Some("bob"));
    }

    #[test]
    fn it_suffixes_taken_names_with_the_first_free_counter() {
        let mut room = Room::new();
        for connection_id in 1..=3 {
            room.join(connection_id);
        }
        assert_eq!(room.identify(&1, "bob"), Some("bob".to_string()));
        assert_eq!(room.identify(&2, "bob"), Some("bob1".to_string()));
        assert_eq!(room.identify(&3, "bob"), Some("bob2".to_string()));
    }

    #[test]
    fn it_ignores_a_second_identify() {
        let mut room = Room::new();
        room.join(1);
        room.identify(&1, "bob");
        assert_eq!(room.identify(&1, "alice"), None);
        assert_eq!(room.username_of(&1), Some("bob"));
    }

    #[test]
    fn it_rejects_renaming_to_a_name_held_by_another_member() {
        let mut room = Room::new();
        room.join(1);
        room.join(2);
        room.identify(&1, "bob");
        room.identify(&2, "alice");
        assert!(matches!(room.rename(&2, "bob"), Err(RenameError::NameTaken)));
        assert_eq!(room.username_of(&2), Some("alice"));
    }

    #[test]
    fn it_allows_renaming_to_ones_own_name() {
        let mut room = Room::new();
        room.join(1);
        room.identify(&1, "bob");
        assert!(room.rename(&1, "bob").is_ok());
        assert_eq!(room.username_of(&1), Some("bob"));
    }

    #[test]
    fn it_rejects_renames_from_unknown_connections() {
        let mut room = Room::new();
        assert!(matches!(
            room.rename(&7, "bob"),
            Err(RenameError::UnknownConnection)
        ));
    }

    #[test]
    fn it_keeps_usernames_pairwise_distinct() {
        let mut room = Room::new();
        for connection_id in 1..=5 {
            room.join(connection_id);
            room.identify(&connection_id, "al");
        }
        let _ = room.rename(&3, "betty");
        let _ = room.rename(&4, "betty");
        let names = room.usernames();
        let distinct: HashSet<&String> = names.iter().collect();
        assert_eq!(names.len(), distinct.len());
    }

    #[test]
    fn it_lists_usernames_in_join_order() {
        let mut room = Room::new();
        for (connection_id, name) in &[(1, "carol"), (2, "al"), (3, "bob")] {
            room.join(*connection_id);
            room.identify(connection_id, name);
        }
        assert_eq!(room.usernames(), vec!["carol", "al", "bob"]);
    }

    #[test]
    fn it_removes_a_member_once() {
        let mut room = Room::new();
        room.join(1);
        assert!(room.leave(&1));
        assert!(!room.leave(&1));
        assert!(room.is_empty());
    }

    #[test]
    fn it_uniquifies_against_the_placeholder_too() {
        let mut room = Room::new();
        room.join(1);
        room.join(2);
        assert_eq!(
            room.identify(&2, PLACEHOLDER_NAME),
            Some(format!("{}1", PLACEHOLDER_NAME))
        );
    }
}
