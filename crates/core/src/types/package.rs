//! Camp packages and their pricing.

use rust_decimal::Decimal;

use super::status::{PaymentOption, string_enum};

string_enum! {
    /// A priced enrollment tier.
    pub enum Package {
        /// One week of camp with daily training sessions.
        Standard => ("standard", "Standard"),
        /// Standard week plus technical clinics with specialist coaches.
        HighSpecialization => ("high_specialization", "High Specialization"),
    }
}

impl Package {
    /// Full price of the package in euros.
    #[must_use]
    pub fn price(self) -> Decimal {
        match self {
            Self::Standard => Decimal::new(390, 0),
            Self::HighSpecialization => Decimal::new(540, 0),
        }
    }

    /// Upfront deposit (acconto) accepted instead of the full price.
    #[must_use]
    pub fn deposit(self) -> Decimal {
        match self {
            Self::Standard => Decimal::new(150, 0),
            Self::HighSpecialization => Decimal::new(200, 0),
        }
    }

    /// Amount charged at checkout for the chosen payment option.
    #[must_use]
    pub fn checkout_amount(self, option: PaymentOption) -> Decimal {
        match option {
            PaymentOption::Full => self.price(),
            PaymentOption::Deposit => self.deposit(),
        }
    }

    /// Services included in the package, shown on the home page and in the
    /// wizard.
    #[must_use]
    pub const fn included_services(self) -> &'static [&'static str] {
        match self {
            Self::Standard => &[
                "Full-day training, Monday to Saturday",
                "Lunch and afternoon snack",
                "Camp kit (t-shirt, shorts, water bottle)",
                "Insurance coverage",
            ],
            Self::HighSpecialization => &[
                "Everything in the Standard package",
                "Daily technical clinic with specialist coaches",
                "Video analysis session",
                "Individual end-of-camp evaluation",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_is_less_than_price() {
        for package in Package::ALL {
            assert!(package.deposit() < package.price());
            assert!(package.deposit() > Decimal::ZERO);
        }
    }

    #[test]
    fn test_checkout_amount() {
        assert_eq!(
            Package::Standard.checkout_amount(PaymentOption::Full),
            Decimal::new(390, 0)
        );
        assert_eq!(
            Package::HighSpecialization.checkout_amount(PaymentOption::Deposit),
            Decimal::new(200, 0)
        );
    }
}
