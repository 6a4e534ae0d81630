//! Identity directory (login roster).
//!
//! The directory is a trusted collaborator, not an auth system: it maps a
//! (role, login id) pair to a display name and nothing more. By default
//! it serves a built-in demo roster; pointing `UNIMERGE_ROSTER` at a JSON
//! file (an array of `{loginId, displayName, role}` entries) switches to
//! that file, re-read on every lookup so the roster can be edited live.

use std::path::PathBuf;

use tracing::debug;
use unimerge_protocol::{Identity, Role};

use crate::error::{Error, Result};

/// Maps login ids to identities.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    roster: Option<PathBuf>,
}

impl Directory {
    /// Directory backed by the built-in demo roster.
    pub fn builtin() -> Self {
        Self { roster: None }
    }

    /// Directory backed by a JSON roster file, re-read per lookup.
    pub fn from_file(path: PathBuf) -> Self {
        Self { roster: Some(path) }
    }

    /// Resolve a login attempt to an identity.
    ///
    /// Unknown id gives [`Error::UnknownLogin`]; an id registered under a
    /// different role gives [`Error::RoleMismatch`]; an unreadable roster
    /// file gives [`Error::Connectivity`] - the caller never reached the
    /// directory, as opposed to being rejected by it.
    pub async fn lookup(&self, role: Role, login_id: &str) -> Result<Identity> {
        let login_id = login_id.trim();
        if login_id.is_empty() {
            return Err(Error::InvalidRequest("login id must not be empty".into()));
        }

        let entries = self.entries().await?;
        let Some(entry) = entries.into_iter().find(|e| e.login_id == login_id) else {
            return Err(Error::UnknownLogin {
                role,
                login_id: login_id.to_string(),
            });
        };
        if entry.role != role {
            return Err(Error::RoleMismatch {
                login_id: login_id.to_string(),
                requested: role,
            });
        }

        debug!(login = %entry.login_id, role = %entry.role, "login resolved");
        Ok(entry)
    }

    /// Display name for a login id, any role.
    ///
    /// Soft read used by the slip renderer; roster trouble or a missing
    /// entry is `None` and the caller falls back to the raw id.
    pub async fn display_name(&self, login_id: &str) -> Option<String> {
        let entries = self.entries().await.ok()?;
        entries
            .into_iter()
            .find(|e| e.login_id == login_id)
            .map(|e| e.display_name)
    }

    async fn entries(&self) -> Result<Vec<Identity>> {
        match &self.roster {
            None => Ok(builtin_roster()),
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| Error::Connectivity(format!("{}: {e}", path.display())))?;
                serde_json::from_str(&raw)
                    .map_err(|e| Error::Connectivity(format!("{}: {e}", path.display())))
            }
        }
    }
}

/// Roster served when no `UNIMERGE_ROSTER` file is configured.
fn builtin_roster() -> Vec<Identity> {
    let entry = |login_id: &str, display_name: &str, role: Role| Identity {
        login_id: login_id.to_string(),
        display_name: display_name.to_string(),
        role,
    };
    vec![
        entry("U2021001", "Adaeze Okafor", Role::Student),
        entry("U2021002", "Tunde Balogun", Role::Student),
        entry("U2021003", "Maryam Bello", Role::Student),
        entry("U2021004", "Chinedu Eze", Role::Student),
        entry("L-501", "Dr. Ngozi Adeyemi", Role::Authority),
        entry("L-502", "Prof. Ibrahim Musa", Role::Authority),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn builtin_roster_resolves_known_logins() {
        let directory = Directory::builtin();

        let student = directory.lookup(Role::Student, "U2021001").await.unwrap();
        assert_eq!(student.display_name, "Adaeze Okafor");
        assert_eq!(student.role, Role::Student);

        let authority = directory.lookup(Role::Authority, "L-501").await.unwrap();
        assert_eq!(authority.display_name, "Dr. Ngozi Adeyemi");

        // Login ids are trimmed before matching.
        let trimmed = directory.lookup(Role::Student, "  U2021002 ").await.unwrap();
        assert_eq!(trimmed.login_id, "U2021002");
    }

    #[tokio::test]
    async fn unknown_id_and_wrong_role_are_distinct_rejections() {
        let directory = Directory::builtin();

        let err = directory.lookup(Role::Student, "U9999999").await.unwrap_err();
        assert!(matches!(err, Error::UnknownLogin { .. }), "{err}");

        // A student id presented under the authority role.
        let err = directory.lookup(Role::Authority, "U2021001").await.unwrap_err();
        assert!(matches!(err, Error::RoleMismatch { .. }), "{err}");

        let err = directory.lookup(Role::Student, "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
    }

    #[tokio::test]
    async fn roster_file_is_reread_per_lookup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"loginId": "U1", "displayName": "Ada", "role": "student"}}]"#
        )
        .unwrap();
        let directory = Directory::from_file(file.path().to_path_buf());

        let ada = directory.lookup(Role::Student, "U1").await.unwrap();
        assert_eq!(ada.display_name, "Ada");
        let err = directory.lookup(Role::Student, "U2").await.unwrap_err();
        assert!(matches!(err, Error::UnknownLogin { .. }));

        // A live edit is visible on the very next lookup.
        std::fs::write(
            file.path(),
            r#"[{"loginId": "U1", "displayName": "Ada", "role": "student"},
                {"loginId": "U2", "displayName": "Tunde", "role": "student"}]"#,
        )
        .unwrap();
        let tunde = directory.lookup(Role::Student, "U2").await.unwrap();
        assert_eq!(tunde.display_name, "Tunde");
    }

    #[tokio::test]
    async fn roster_accepts_the_lecturer_role_alias() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"loginId": "L-9", "displayName": "Dr. Bello", "role": "lecturer"}}]"#
        )
        .unwrap();
        let directory = Directory::from_file(file.path().to_path_buf());

        let identity = directory.lookup(Role::Authority, "L-9").await.unwrap();
        assert_eq!(identity.role, Role::Authority);
    }

    #[tokio::test]
    async fn unreadable_roster_is_a_connectivity_error() {
        let missing = Directory::from_file(PathBuf::from("/nonexistent/roster.json"));
        let err = missing.lookup(Role::Student, "U1").await.unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)), "{err}");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let garbled = Directory::from_file(file.path().to_path_buf());
        let err = garbled.lookup(Role::Student, "U1").await.unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)), "{err}");
    }

    #[tokio::test]
    async fn display_name_is_role_agnostic_and_soft() {
        let directory = Directory::builtin();
        assert_eq!(
            directory.display_name("L-502").await.as_deref(),
            Some("Prof. Ibrahim Musa")
        );
        assert_eq!(directory.display_name("U9999999").await, None);

        let missing = Directory::from_file(PathBuf::from("/nonexistent/roster.json"));
        assert_eq!(missing.display_name("U1").await, None);
    }
}
