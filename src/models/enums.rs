use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
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

str_enum!(SampleStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Reported => "reported",
});

str_enum!(ResultFlag {
    Normal => "normal",
    Low => "low",
    High => "high",
    CriticalLow => "critical-low",
    CriticalHigh => "critical-high",
});

str_enum!(AttendanceStatus {
    Present => "present",
    Absent => "absent",
    Leave => "leave",
    HalfDay => "half-day",
});

str_enum!(FinanceKind {
    Income => "income",
    Expense => "expense",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
});
