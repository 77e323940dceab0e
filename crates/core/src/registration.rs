//! Camp registration records.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    AgeBucket, Email, ExperienceLevel, FiscalCode, Gender, Package, PaymentOption, PaymentStatus,
    PhoneNumber, RegistrationId, RegistrationStatus, ShirtSize,
};

/// Errors raised by registration mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A payment amount was negative.
    #[error("payment amount cannot be negative")]
    NegativeAmount,
}

/// Validated wizard output, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub camper_first_name: String,
    pub camper_last_name: String,
    pub camper_birth_date: NaiveDate,
    pub camper_birth_place: String,
    pub camper_fiscal_code: FiscalCode,
    pub camper_gender: Gender,
    pub shirt_size: ShirtSize,
    pub experience: ExperienceLevel,
    pub club: Option<String>,
    pub allergies: Option<String>,
    pub medical_notes: Option<String>,

    pub parent_first_name: String,
    pub parent_last_name: String,
    pub parent_email: Email,
    pub parent_phone: PhoneNumber,
    pub parent_fiscal_code: FiscalCode,
    pub address: String,
    pub city: String,
    pub postal_code: String,

    pub emergency_name: String,
    pub emergency_phone: PhoneNumber,
    pub emergency_relationship: String,

    pub package: Package,
    pub payment_option: PaymentOption,

    pub privacy_consent: bool,
    pub regulations_consent: bool,
    pub photo_consent: bool,
}

/// A stored registration.
///
/// Mirrors one row of the `registrations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,

    pub camper_first_name: String,
    pub camper_last_name: String,
    pub camper_birth_date: NaiveDate,
    pub camper_birth_place: String,
    pub camper_fiscal_code: FiscalCode,
    pub camper_gender: Gender,
    pub shirt_size: ShirtSize,
    pub experience: ExperienceLevel,
    pub club: Option<String>,
    pub allergies: Option<String>,
    pub medical_notes: Option<String>,

    pub parent_first_name: String,
    pub parent_last_name: String,
    pub parent_email: Email,
    pub parent_phone: PhoneNumber,
    pub parent_fiscal_code: FiscalCode,
    pub address: String,
    pub city: String,
    pub postal_code: String,

    pub emergency_name: String,
    pub emergency_phone: PhoneNumber,
    pub emergency_relationship: String,

    pub package: Package,
    pub payment_option: PaymentOption,

    pub privacy_consent: bool,
    pub regulations_consent: bool,
    pub photo_consent: bool,

    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    /// Total received so far, in euros.
    pub amount_paid: Decimal,
    /// Checkout session most recently created for this registration.
    pub stripe_session_id: Option<String>,
    /// Checkout sessions whose payments have been recorded (idempotency keys).
    pub paid_session_ids: Vec<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    /// Internal admin notes.
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Build a fresh pending, unpaid registration from wizard output.
    #[must_use]
    pub fn from_new(id: RegistrationId, new: NewRegistration, now: DateTime<Utc>) -> Self {
        Self {
            id,
            camper_first_name: new.camper_first_name,
            camper_last_name: new.camper_last_name,
            camper_birth_date: new.camper_birth_date,
            camper_birth_place: new.camper_birth_place,
            camper_fiscal_code: new.camper_fiscal_code,
            camper_gender: new.camper_gender,
            shirt_size: new.shirt_size,
            experience: new.experience,
            club: new.club,
            allergies: new.allergies,
            medical_notes: new.medical_notes,
            parent_first_name: new.parent_first_name,
            parent_last_name: new.parent_last_name,
            parent_email: new.parent_email,
            parent_phone: new.parent_phone,
            parent_fiscal_code: new.parent_fiscal_code,
            address: new.address,
            city: new.city,
            postal_code: new.postal_code,
            emergency_name: new.emergency_name,
            emergency_phone: new.emergency_phone,
            emergency_relationship: new.emergency_relationship,
            package: new.package,
            payment_option: new.payment_option,
            privacy_consent: new.privacy_consent,
            regulations_consent: new.regulations_consent,
            photo_consent: new.photo_consent,
            status: RegistrationStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            amount_paid: Decimal::ZERO,
            stripe_session_id: None,
            paid_session_ids: Vec::new(),
            reminder_sent_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Camper full name.
    #[must_use]
    pub fn camper_name(&self) -> String {
        format!("{} {}", self.camper_first_name, self.camper_last_name)
    }

    /// Parent or guardian full name.
    #[must_use]
    pub fn parent_name(&self) -> String {
        format!("{} {}", self.parent_first_name, self.parent_last_name)
    }

    /// Full package price.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.package.price()
    }

    /// Remaining balance; never negative even after overpayment.
    #[must_use]
    pub fn amount_due(&self) -> Decimal {
        (self.total_price() - self.amount_paid).max(Decimal::ZERO)
    }

    /// Amount the next checkout should charge.
    ///
    /// A family that already paid the deposit is charged the balance.
    #[must_use]
    pub fn next_checkout_amount(&self) -> Decimal {
        if self.amount_paid > Decimal::ZERO {
            return self.amount_due();
        }
        self.package.checkout_amount(self.payment_option)
    }

    /// Whether the registration counts toward statistics.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != RegistrationStatus::Cancelled
    }

    /// Whether admin notes contain anything besides whitespace.
    #[must_use]
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Camper age in whole years on `date`.
    #[must_use]
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        age_between(self.camper_birth_date, date)
    }

    /// Camper age bucket on `date`.
    #[must_use]
    pub fn age_bucket_on(&self, date: NaiveDate) -> AgeBucket {
        AgeBucket::for_age(self.age_on(date))
    }

    /// Record a received payment.
    ///
    /// Payments carrying a checkout session ID that was already recorded are
    /// ignored, so replayed webhooks do not double count. A pending
    /// registration becomes confirmed once any money has been received.
    ///
    /// Returns whether the payment was applied.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::NegativeAmount`] for negative amounts.
    pub fn record_payment(
        &mut self,
        amount: Decimal,
        session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistrationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(RegistrationError::NegativeAmount);
        }

        if let Some(session_id) = session_id {
            if self.paid_session_ids.iter().any(|id| id == session_id) {
                return Ok(false);
            }
            self.paid_session_ids.push(session_id.to_string());
        }

        self.amount_paid += amount;
        self.payment_status = if self.amount_due().is_zero() {
            PaymentStatus::Paid
        } else if self.amount_paid > Decimal::ZERO {
            PaymentStatus::DepositPaid
        } else {
            PaymentStatus::Unpaid
        };

        if self.status == RegistrationStatus::Pending && self.amount_paid > Decimal::ZERO {
            self.status = RegistrationStatus::Confirmed;
        }
        self.updated_at = now;
        Ok(true)
    }
}

/// Whole years between `birth` and `on`.
#[must_use]
pub fn age_between(birth: NaiveDate, on: NaiveDate) -> u32 {
    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}
