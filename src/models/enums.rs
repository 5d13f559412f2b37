use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate a closed enum serialized through its display string,
/// with `as_str`, `ALL` (declaration order) and `FromStr`.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

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
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(
    /// Five-bucket clinical sentiment derived from a signed polarity score.
    SentimentLabel {
        Positive => "POSITIVE",
        Reassured => "REASSURED",
        Neutral => "NEUTRAL",
        Concerned => "CONCERNED",
        Negative => "NEGATIVE",
    }
);

str_enum!(
    /// Fixed intent taxonomy. Declaration order is the tie-break order.
    Intent {
        SeekingReassurance => "Seeking reassurance",
        ReportingSymptoms => "Reporting symptoms",
        ExpressingConcern => "Expressing concern",
        RequestingTreatment => "Requesting treatment",
        DiscussingRecovery => "Discussing recovery",
    }
);

str_enum!(Severity {
    Mild => "Mild",
    Moderate => "Moderate",
    Severe => "Severe",
});

str_enum!(
    /// Entity categories in lexicon registration order.
    EntityCategory {
        Symptoms => "Symptoms",
        Treatment => "Treatment",
        Diagnosis => "Diagnosis",
        Prognosis => "Prognosis",
    }
);
