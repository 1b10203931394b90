use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
});

str_enum!(ReportStatus {
    Uploaded => "uploaded",
    Shared => "shared",
    Reviewed => "reviewed",
});

impl Role {
    /// Dashboard path the navigation surface sends this role to.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Patient => "/user",
            Role::Doctor => "/doctor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parses_and_routes() {
        assert_eq!(Role::from_str("doctor").unwrap(), Role::Doctor);
        assert_eq!(Role::Patient.dashboard_path(), "/user");
        assert_eq!(Role::Doctor.dashboard_path(), "/doctor");
    }

    #[test]
    fn report_status_serializes_lowercase() {
        let json = serde_json::to_string(&ReportStatus::Reviewed).unwrap();
        assert_eq!(json, "\"reviewed\"");
        let parsed: ReportStatus = serde_json::from_str("\"shared\"").unwrap();
        assert_eq!(parsed, ReportStatus::Shared);
    }

    #[test]
    fn invalid_enum_value_is_rejected() {
        let err = Role::from_str("nurse").unwrap_err();
        match err {
            DatabaseError::InvalidEnum { field, value } => {
                assert_eq!(field, "Role");
                assert_eq!(value, "nurse");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
