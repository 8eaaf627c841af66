use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

// Canonical status labels are the Russian strings shown on the portal and
// stored in the documents table.
str_enum!(DocumentStatus {
    New => "Новый",
    UnderReview => "На рассмотрении",
    InExecution => "На исполнении",
    Approved => "Согласован",
    Rejected => "Отказан",
    Completed => "Выполнено",
});

impl DocumentStatus {
    /// Terminal states accept no further workflow transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Completed)
    }
}

str_enum!(Role {
    Admin => "EDO Admin",
    Manager => "EDO Manager",
    Director => "EDO Director",
    Reception => "EDO Reception",
    User => "EDO User",
});
