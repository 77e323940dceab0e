//! String-backed enums stored as `TEXT` columns.
//!
//! Every enum round-trips through the same snake_case string in the
//! database, in form posts, in query strings and in JSON.

/// Error returned when a string does not name a known enum variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Define an enum whose variants map to fixed strings and display labels.
///
/// Generates `ALL`, `as_str()`, `label()`, `Display` and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => ($value:literal, $label:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant
            ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored string form.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            /// Human-readable label for templates.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::status::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($value => Ok(Self::$variant),)+
                    _ => Err($crate::types::status::ParseEnumError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Registration lifecycle status.
    pub enum RegistrationStatus {
        /// Submitted, waiting for payment or admin review.
        Pending => ("pending", "Pending"),
        /// Paid (at least the deposit) or confirmed by an admin.
        Confirmed => ("confirmed", "Confirmed"),
        /// Withdrawn; excluded from statistics.
        Cancelled => ("cancelled", "Cancelled"),
    }
}

string_enum! {
    /// Payment state of a registration.
    pub enum PaymentStatus {
        Unpaid => ("unpaid", "Unpaid"),
        DepositPaid => ("deposit_paid", "Deposit paid"),
        Paid => ("paid", "Paid in full"),
        Refunded => ("refunded", "Refunded"),
    }
}

string_enum! {
    /// How much the family pays at checkout.
    pub enum PaymentOption {
        Full => ("full", "Full payment"),
        Deposit => ("deposit", "Deposit"),
    }
}

string_enum! {
    /// Camp t-shirt size.
    pub enum ShirtSize {
        Xs => ("xs", "XS"),
        S => ("s", "S"),
        M => ("m", "M"),
        L => ("l", "L"),
        Xl => ("xl", "XL"),
        Xxl => ("xxl", "XXL"),
    }
}

string_enum! {
    /// Self-declared sport experience of the camper.
    pub enum ExperienceLevel {
        Beginner => ("beginner", "Beginner"),
        Intermediate => ("intermediate", "Intermediate"),
        Advanced => ("advanced", "Advanced"),
    }
}

string_enum! {
    /// Camper gender as declared on the form.
    pub enum Gender {
        Male => ("male", "Male"),
        Female => ("female", "Female"),
        Other => ("other", "Other"),
    }
}

string_enum! {
    /// Age group used by the dashboard and the admin filter.
    pub enum AgeBucket {
        SixToEight => ("6-8", "6-8 years"),
        NineToEleven => ("9-11", "9-11 years"),
        TwelveToFourteen => ("12-14", "12-14 years"),
        FifteenToSeventeen => ("15-17", "15-17 years"),
    }
}

impl AgeBucket {
    /// Bucket for an age in whole years; ages outside 6-17 clamp to the
    /// nearest bucket.
    #[must_use]
    pub const fn for_age(age: u32) -> Self {
        match age {
            0..=8 => Self::SixToEight,
            9..=11 => Self::NineToEleven,
            12..=14 => Self::TwelveToFourteen,
            _ => Self::FifteenToSeventeen,
        }
    }
}

string_enum! {
    /// Admin role with different permission levels.
    pub enum AdminRole {
        /// Full access including admin user management and deletions.
        Admin => ("admin", "Admin"),
        /// Registrations and gallery management only.
        Subadmin => ("subadmin", "Sub-admin"),
    }
}

impl AdminRole {
    /// Whether this role may invite, modify or remove admin users.
    #[must_use]
    pub const fn can_manage_admins(self) -> bool {
        matches!(self, Self::Admin)
    }
}

string_enum! {
    /// Kind of gallery collection.
    pub enum CollectionType {
        Camp => ("camp", "Summer camp"),
        Event => ("event", "Event"),
        Training => ("training", "Training"),
        Other => ("other", "Other"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_variants() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), *status);
        }
        for size in ShirtSize::ALL {
            assert_eq!(size.to_string().parse::<ShirtSize>().unwrap(), *size);
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = "gold".parse::<PaymentOption>().unwrap_err();
        assert_eq!(err.kind, "PaymentOption");
        assert_eq!(err.to_string(), "invalid PaymentOption: gold");
    }

    #[test]
    fn test_serde_uses_stored_string() {
        let json = serde_json::to_string(&PaymentStatus::DepositPaid).unwrap();
        assert_eq!(json, "\"deposit_paid\"");
        let bucket: AgeBucket = serde_json::from_str("\"12-14\"").unwrap();
        assert_eq!(bucket, AgeBucket::TwelveToFourteen);
    }

    #[test]
    fn test_age_bucket_clamps() {
        assert_eq!(AgeBucket::for_age(5), AgeBucket::SixToEight);
        assert_eq!(AgeBucket::for_age(8), AgeBucket::SixToEight);
        assert_eq!(AgeBucket::for_age(9), AgeBucket::NineToEleven);
        assert_eq!(AgeBucket::for_age(14), AgeBucket::TwelveToFourteen);
        assert_eq!(AgeBucket::for_age(19), AgeBucket::FifteenToSeventeen);
    }

    #[test]
    fn test_admin_role_permissions() {
        assert!(AdminRole::Admin.can_manage_admins());
        assert!(!AdminRole::Subadmin.can_manage_admins());
    }
}
