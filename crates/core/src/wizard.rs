//! Multi-step registration wizard.
//!
//! The browser posts one step at a time. Each post is merged into a
//! [`RegistrationDraft`] kept in the session and validated with
//! [`validate_step`]. A step may only be shown once every earlier step is
//! valid, and the final submit re-validates everything through
//! [`RegistrationDraft::into_new_registration`].
//!
//! Ages are checked against a reference date (the first day of camp), not
//! against the day the form is filled in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::registration::{NewRegistration, age_between};
use crate::types::{
    Email, ExperienceLevel, FiscalCode, Gender, Package, PaymentOption, PhoneNumber, ShirtSize,
};

/// Field name to user-facing error message. Empty means valid.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Youngest accepted camper age at the reference date.
pub const MIN_CAMPER_AGE: u32 = 6;
/// Oldest accepted camper age at the reference date.
pub const MAX_CAMPER_AGE: u32 = 17;

/// One page of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Camper,
    Parent,
    Emergency,
    Package,
    Review,
}

impl WizardStep {
    /// Every step in order.
    pub const ALL: [Self; 5] = [
        Self::Camper,
        Self::Parent,
        Self::Emergency,
        Self::Package,
        Self::Review,
    ];

    /// 1-based position, as used in URLs.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Camper => 1,
            Self::Parent => 2,
            Self::Emergency => 3,
            Self::Package => 4,
            Self::Review => 5,
        }
    }

    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Camper),
            2 => Some(Self::Parent),
            3 => Some(Self::Emergency),
            4 => Some(Self::Package),
            5 => Some(Self::Review),
            _ => None,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    /// Page heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Camper => "Camper",
            Self::Parent => "Parent or guardian",
            Self::Emergency => "Emergency contact",
            Self::Package => "Package and consents",
            Self::Review => "Review",
        }
    }
}

/// Registration form data as posted by the browser.
///
/// Every text field is optional so a partially completed wizard can be kept
/// in the session. Checkboxes are absent from the post when unticked, which
/// deserializes to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationDraft {
    pub camper_first_name: Option<String>,
    pub camper_last_name: Option<String>,
    pub camper_birth_date: Option<String>,
    pub camper_birth_place: Option<String>,
    pub camper_fiscal_code: Option<String>,
    pub camper_gender: Option<String>,
    pub shirt_size: Option<String>,
    pub experience: Option<String>,
    pub club: Option<String>,
    pub allergies: Option<String>,
    pub medical_notes: Option<String>,

    pub parent_first_name: Option<String>,
    pub parent_last_name: Option<String>,
    pub parent_email: Option<String>,
    pub parent_phone: Option<String>,
    pub parent_fiscal_code: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,

    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
    pub emergency_relationship: Option<String>,

    pub package: Option<String>,
    pub payment_option: Option<String>,
    pub privacy_consent: bool,
    pub regulations_consent: bool,
    pub photo_consent: bool,
}

impl RegistrationDraft {
    /// Copy the fields owned by `step` from a freshly posted form.
    ///
    /// Fields belonging to other steps are left untouched, so posting step 2
    /// never wipes what was entered on step 1.
    pub fn merge_step(&mut self, step: WizardStep, posted: Self) {
        match step {
            WizardStep::Camper => {
                self.camper_first_name = posted.camper_first_name;
                self.camper_last_name = posted.camper_last_name;
                self.camper_birth_date = posted.camper_birth_date;
                self.camper_birth_place = posted.camper_birth_place;
                self.camper_fiscal_code = posted.camper_fiscal_code;
                self.camper_gender = posted.camper_gender;
                self.shirt_size = posted.shirt_size;
                self.experience = posted.experience;
                self.club = posted.club;
                self.allergies = posted.allergies;
                self.medical_notes = posted.medical_notes;
            }
            WizardStep::Parent => {
                self.parent_first_name = posted.parent_first_name;
                self.parent_last_name = posted.parent_last_name;
                self.parent_email = posted.parent_email;
                self.parent_phone = posted.parent_phone;
                self.parent_fiscal_code = posted.parent_fiscal_code;
                self.address = posted.address;
                self.city = posted.city;
                self.postal_code = posted.postal_code;
            }
            WizardStep::Emergency => {
                self.emergency_name = posted.emergency_name;
                self.emergency_phone = posted.emergency_phone;
                self.emergency_relationship = posted.emergency_relationship;
            }
            WizardStep::Package => {
                self.package = posted.package;
                self.payment_option = posted.payment_option;
                self.privacy_consent = posted.privacy_consent;
                self.regulations_consent = posted.regulations_consent;
                self.photo_consent = posted.photo_consent;
            }
            WizardStep::Review => {}
        }
    }

    /// Selected package, if it names a known one.
    #[must_use]
    pub fn selected_package(&self) -> Option<Package> {
        self.package.as_deref().and_then(|p| p.parse().ok())
    }

    /// Selected payment option, if it names a known one.
    #[must_use]
    pub fn selected_payment_option(&self) -> Option<PaymentOption> {
        self.payment_option.as_deref().and_then(|p| p.parse().ok())
    }

    /// Convert a fully valid draft into a registration payload.
    ///
    /// # Errors
    ///
    /// Returns every field error across all steps if any step is invalid.
    pub fn into_new_registration(
        self,
        reference_date: NaiveDate,
    ) -> Result<NewRegistration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let camper = parse_camper(&self, reference_date, &mut errors);
        let parent = parse_parent(&self, &mut errors);
        let emergency = parse_emergency(&self, &mut errors);
        let package = parse_package(&self, &mut errors);

        let (Some(camper), Some(parent), Some(emergency), Some(package)) =
            (camper, parent, emergency, package)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewRegistration {
            camper_first_name: camper.first_name,
            camper_last_name: camper.last_name,
            camper_birth_date: camper.birth_date,
            camper_birth_place: camper.birth_place,
            camper_fiscal_code: camper.fiscal_code,
            camper_gender: camper.gender,
            shirt_size: camper.shirt_size,
            experience: camper.experience,
            club: optional_text(self.club.as_deref()),
            allergies: optional_text(self.allergies.as_deref()),
            medical_notes: optional_text(self.medical_notes.as_deref()),
            parent_first_name: parent.first_name,
            parent_last_name: parent.last_name,
            parent_email: parent.email,
            parent_phone: parent.phone,
            parent_fiscal_code: parent.fiscal_code,
            address: parent.address,
            city: parent.city,
            postal_code: parent.postal_code,
            emergency_name: emergency.name,
            emergency_phone: emergency.phone,
            emergency_relationship: emergency.relationship,
            package: package.package,
            payment_option: package.payment_option,
            privacy_consent: true,
            regulations_consent: true,
            photo_consent: self.photo_consent,
        })
    }
}

/// Validate a single step. An empty map means the step may advance.
///
/// The review step re-validates every earlier step.
#[must_use]
pub fn validate_step(
    step: WizardStep,
    draft: &RegistrationDraft,
    reference_date: NaiveDate,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match step {
        WizardStep::Camper => {
            parse_camper(draft, reference_date, &mut errors);
        }
        WizardStep::Parent => {
            parse_parent(draft, &mut errors);
        }
        WizardStep::Emergency => {
            parse_emergency(draft, &mut errors);
        }
        WizardStep::Package => {
            parse_package(draft, &mut errors);
        }
        WizardStep::Review => return validate_all(draft, reference_date),
    }
    errors
}

/// Errors of every step merged into one map.
#[must_use]
pub fn validate_all(draft: &RegistrationDraft, reference_date: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    parse_camper(draft, reference_date, &mut errors);
    parse_parent(draft, &mut errors);
    parse_emergency(draft, &mut errors);
    parse_package(draft, &mut errors);
    errors
}

/// The earliest step that still has errors, if any.
#[must_use]
pub fn first_invalid_step(
    draft: &RegistrationDraft,
    reference_date: NaiveDate,
) -> Option<WizardStep> {
    WizardStep::ALL
        .into_iter()
        .filter(|step| *step != WizardStep::Review)
        .find(|step| !validate_step(*step, draft, reference_date).is_empty())
}

/// The furthest step the visitor may open.
#[must_use]
pub fn furthest_reachable_step(draft: &RegistrationDraft, reference_date: NaiveDate) -> WizardStep {
    first_invalid_step(draft, reference_date).unwrap_or(WizardStep::Review)
}

struct CamperFields {
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
    birth_place: String,
    fiscal_code: FiscalCode,
    gender: Gender,
    shirt_size: ShirtSize,
    experience: ExperienceLevel,
}

struct ParentFields {
    first_name: String,
    last_name: String,
    email: Email,
    phone: PhoneNumber,
    fiscal_code: FiscalCode,
    address: String,
    city: String,
    postal_code: String,
}

struct EmergencyFields {
    name: String,
    phone: PhoneNumber,
    relationship: String,
}

struct PackageFields {
    package: Package,
    payment_option: PaymentOption,
}

fn parse_camper(
    draft: &RegistrationDraft,
    reference_date: NaiveDate,
    errors: &mut FieldErrors,
) -> Option<CamperFields> {
    let first_name = required(
        errors,
        "camper_first_name",
        draft.camper_first_name.as_deref(),
        "Please enter the camper's first name.",
    );
    let last_name = required(
        errors,
        "camper_last_name",
        draft.camper_last_name.as_deref(),
        "Please enter the camper's last name.",
    );
    let birth_place = required(
        errors,
        "camper_birth_place",
        draft.camper_birth_place.as_deref(),
        "Please enter the place of birth.",
    );

    let birth_date = required(
        errors,
        "camper_birth_date",
        draft.camper_birth_date.as_deref(),
        "Please enter the date of birth.",
    )
    .and_then(|raw| match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert("camper_birth_date", "Please use the format YYYY-MM-DD.".to_string());
            None
        }
    })
    .and_then(|date| {
        let age = if date > reference_date {
            None
        } else {
            Some(age_between(date, reference_date))
        };
        match age {
            Some(age) if (MIN_CAMPER_AGE..=MAX_CAMPER_AGE).contains(&age) => Some(date),
            _ => {
                errors.insert(
                    "camper_birth_date",
                    format!(
                        "Campers must be between {MIN_CAMPER_AGE} and {MAX_CAMPER_AGE} years \
                         old when camp starts."
                    ),
                );
                None
            }
        }
    });

    let fiscal_code = required(
        errors,
        "camper_fiscal_code",
        draft.camper_fiscal_code.as_deref(),
        "Please enter the camper's fiscal code.",
    )
    .and_then(|raw| {
        parse_field(
            errors,
            "camper_fiscal_code",
            FiscalCode::parse(&raw),
            "Please enter a valid Italian fiscal code.",
        )
    });

    let gender = choice::<Gender>(
        errors,
        "camper_gender",
        draft.camper_gender.as_deref(),
        "Please select a gender.",
    );
    let shirt_size = choice::<ShirtSize>(
        errors,
        "shirt_size",
        draft.shirt_size.as_deref(),
        "Please select a t-shirt size.",
    );
    let experience = choice::<ExperienceLevel>(
        errors,
        "experience",
        draft.experience.as_deref(),
        "Please select an experience level.",
    );

    Some(CamperFields {
        first_name: first_name?,
        last_name: last_name?,
        birth_date: birth_date?,
        birth_place: birth_place?,
        fiscal_code: fiscal_code?,
        gender: gender?,
        shirt_size: shirt_size?,
        experience: experience?,
    })
}

fn parse_parent(draft: &RegistrationDraft, errors: &mut FieldErrors) -> Option<ParentFields> {
    let first_name = required(
        errors,
        "parent_first_name",
        draft.parent_first_name.as_deref(),
        "Please enter the parent's first name.",
    );
    let last_name = required(
        errors,
        "parent_last_name",
        draft.parent_last_name.as_deref(),
        "Please enter the parent's last name.",
    );

    let email = required(
        errors,
        "parent_email",
        draft.parent_email.as_deref(),
        "Please enter an email address.",
    )
    .and_then(|raw| {
        parse_field(
            errors,
            "parent_email",
            Email::parse(&raw),
            "Please enter a valid email address.",
        )
    });
    let phone = required(
        errors,
        "parent_phone",
        draft.parent_phone.as_deref(),
        "Please enter a phone number.",
    )
    .and_then(|raw| {
        parse_field(
            errors,
            "parent_phone",
            PhoneNumber::parse(&raw),
            "Please enter a valid phone number.",
        )
    });
    let fiscal_code = required(
        errors,
        "parent_fiscal_code",
        draft.parent_fiscal_code.as_deref(),
        "Please enter the parent's fiscal code.",
    )
    .and_then(|raw| {
        parse_field(
            errors,
            "parent_fiscal_code",
            FiscalCode::parse(&raw),
            "Please enter a valid Italian fiscal code.",
        )
    });

    let address = required(
        errors,
        "address",
        draft.address.as_deref(),
        "Please enter a street address.",
    );
    let city = required(errors, "city", draft.city.as_deref(), "Please enter a city.");
    let postal_code = required(
        errors,
        "postal_code",
        draft.postal_code.as_deref(),
        "Please enter a postal code.",
    )
    .and_then(|raw| {
        if raw.len() == 5 && raw.chars().all(|c| c.is_ascii_digit()) {
            Some(raw)
        } else {
            errors.insert("postal_code", "Postal codes have 5 digits.".to_string());
            None
        }
    });

    Some(ParentFields {
        first_name: first_name?,
        last_name: last_name?,
        email: email?,
        phone: phone?,
        fiscal_code: fiscal_code?,
        address: address?,
        city: city?,
        postal_code: postal_code?,
    })
}

fn parse_emergency(draft: &RegistrationDraft, errors: &mut FieldErrors) -> Option<EmergencyFields> {
    let name = required(
        errors,
        "emergency_name",
        draft.emergency_name.as_deref(),
        "Please enter an emergency contact.",
    );
    let relationship = required(
        errors,
        "emergency_relationship",
        draft.emergency_relationship.as_deref(),
        "Please enter the relationship to the camper.",
    );

    let parent_phone = draft
        .parent_phone
        .as_deref()
        .and_then(|p| PhoneNumber::parse(p).ok());
    let phone = required(
        errors,
        "emergency_phone",
        draft.emergency_phone.as_deref(),
        "Please enter the emergency contact's phone number.",
    )
    .and_then(|raw| {
        parse_field(
            errors,
            "emergency_phone",
            PhoneNumber::parse(&raw),
            "Please enter a valid phone number.",
        )
    })
    .and_then(|phone| {
        if parent_phone.as_ref() == Some(&phone) {
            errors.insert(
                "emergency_phone",
                "The emergency number must differ from the parent's number.".to_string(),
            );
            None
        } else {
            Some(phone)
        }
    });

    Some(EmergencyFields {
        name: name?,
        phone: phone?,
        relationship: relationship?,
    })
}

fn parse_package(draft: &RegistrationDraft, errors: &mut FieldErrors) -> Option<PackageFields> {
    let package = choice::<Package>(
        errors,
        "package",
        draft.package.as_deref(),
        "Please choose a package.",
    );
    let payment_option = choice::<PaymentOption>(
        errors,
        "payment_option",
        draft.payment_option.as_deref(),
        "Please choose how you want to pay.",
    );

    if !draft.privacy_consent {
        errors.insert("privacy_consent", "You must accept the privacy policy.".to_string());
    }
    if !draft.regulations_consent {
        errors.insert("regulations_consent", "You must accept the camp regulations.".to_string());
    }
    if !(draft.privacy_consent && draft.regulations_consent) {
        return None;
    }

    Some(PackageFields {
        package: package?,
        payment_option: payment_option?,
    })
}

/// Trimmed non-empty value, or an error for `field`.
fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&str>,
    message: &str,
) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.insert(field, message.to_string());
            None
        }
    }
}

fn parse_field<T, E>(
    errors: &mut FieldErrors,
    field: &'static str,
    parsed: Result<T, E>,
    message: &str,
) -> Option<T> {
    parsed
        .inspect_err(|_| {
            errors.insert(field, message.to_string());
        })
        .ok()
}

/// A select value that must name a known enum variant.
fn choice<T: std::str::FromStr>(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&str>,
    message: &str,
) -> Option<T> {
    let parsed = value.and_then(|v| v.trim().parse::<T>().ok());
    if parsed.is_none() {
        errors.insert(field, message.to_string());
    }
    parsed
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
