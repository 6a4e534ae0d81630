//! Validated domain values shared across the workspace.
//!
//! Everything here is checked at construction: a [`CourseCode`] is never
//! empty, a [`Weekday`] is always one of the seven recognized day names,
//! a [`Slot`] always names a venue. Code downstream can take these values
//! by type and skip re-validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Days of the week recognized by the scheduler.
///
/// Parsing is case-insensitive over the full English names; anything else
/// is rejected before it can reach the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in calendar order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Canonical capitalized name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            _ => Err(Error::InvalidDay(s.trim().to_string())),
        }
    }
}

/// A course identifier, e.g. `CSC301`.
///
/// Normalized to ASCII uppercase at construction so lookups are
/// case-insensitive. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode(String);

impl CourseCode {
    /// Create a course code, trimming and uppercasing the token.
    pub fn new(code: impl AsRef<str>) -> Result<Self> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(Error::EmptyCourseCode);
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// The normalized token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CourseCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<CourseCode> for String {
    fn from(code: CourseCode) -> Self {
        code.0
    }
}

/// The identifier a requester negotiates under (a matric number in the
/// university deployment). Trimmed, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequesterId(String);

impl RequesterId {
    /// Create a requester id from a raw token.
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(Error::EmptyRequester);
        }
        Ok(Self(id.to_string()))
    }

    /// The trimmed token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RequesterId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<RequesterId> for String {
    fn from(id: RequesterId) -> Self {
        id.0
    }
}

/// The unit of exclusive booking: one venue on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Venue name, trimmed and non-empty.
    pub venue: String,
    /// Day of the week.
    pub day: Weekday,
}

impl Slot {
    /// Create a slot; the venue name must be non-empty after trimming.
    pub fn new(venue: impl AsRef<str>, day: Weekday) -> Result<Self> {
        let venue = venue.as_ref().trim();
        if venue.is_empty() {
            return Err(Error::EmptyVenue);
        }
        Ok(Self {
            venue: venue.to_string(),
            day,
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.venue, self.day)
    }
}

/// A registry-allocated negotiation session identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role an authenticated caller acts under.
///
/// The historical frontend sends `lecturer` for the venue authority, so
/// that token is accepted as an alias on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    #[serde(alias = "lecturer")]
    Authority,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => f.write_str("student"),
            Self::Authority => f.write_str("authority"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "authority" | "lecturer" => Ok(Self::Authority),
            _ => Err(Error::InvalidRole(s.trim().to_string())),
        }
    }
}

/// An authenticated caller, as supplied by the identity boundary.
///
/// The core trusts this as given and performs no credential checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub login_id: String,
    pub display_name: String,
    pub role: Role,
}

/// Which side of the exchange sent a message.
///
/// CFP and ACCEPT originate from the requester; PROPOSE, REFUSE and
/// INFORM from the venue authority. Renderers use this to draw
/// direction arrows on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Requester,
    Authority,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requester => f.write_str("requester"),
            Self::Authority => f.write_str("authority"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_parses_case_insensitively() {
        for day in Weekday::ALL {
            let lower: Weekday = day.as_str().to_ascii_lowercase().parse().unwrap();
            let upper: Weekday = day.as_str().to_ascii_uppercase().parse().unwrap();
            assert_eq!(lower, day);
            assert_eq!(upper, day);
        }
    }

    #[test]
    fn weekday_rejects_unknown_tokens() {
        for bad in ["", "Mon", "Funday", "8"] {
            assert!(matches!(
                bad.parse::<Weekday>(),
                Err(Error::InvalidDay(_))
            ));
        }
    }

    #[test]
    fn course_code_normalizes() {
        let code = CourseCode::new("  csc301 ").unwrap();
        assert_eq!(code.as_str(), "CSC301");
        assert_eq!(code, CourseCode::new("CSC301").unwrap());
    }

    #[test]
    fn course_code_rejects_empty() {
        assert_eq!(CourseCode::new("   "), Err(Error::EmptyCourseCode));
    }

    #[test]
    fn course_code_deserialization_validates() {
        assert!(serde_json::from_str::<CourseCode>("\" \"").is_err());

        let ok: CourseCode = serde_json::from_str("\"mth201\"").unwrap();
        assert_eq!(ok.as_str(), "MTH201");
    }

    #[test]
    fn slot_requires_venue() {
        assert_eq!(Slot::new("  ", Weekday::Monday), Err(Error::EmptyVenue));
        let slot = Slot::new(" LT1 ", Weekday::Monday).unwrap();
        assert_eq!(slot.venue, "LT1");
        assert_eq!(slot.to_string(), "LT1 on Monday");
    }

    #[test]
    fn role_accepts_lecturer_alias() {
        assert_eq!("lecturer".parse::<Role>().unwrap(), Role::Authority);
        assert_eq!("Student".parse::<Role>().unwrap(), Role::Student);
        assert!(matches!("admin".parse::<Role>(), Err(Error::InvalidRole(_))));

        let from_json: Role = serde_json::from_str("\"lecturer\"").unwrap();
        assert_eq!(from_json, Role::Authority);
    }

    #[test]
    fn identity_uses_camel_case_on_the_wire() {
        let identity = Identity {
            login_id: "U2021001".to_string(),
            display_name: "Ada Obi".to_string(),
            role: Role::Student,
        };
        let json = serde_json::to_string(&identity).unwrap();
        assert!(json.contains("\"loginId\""));
        assert!(json.contains("\"displayName\""));
        assert!(json.contains("\"student\""));
    }
}
