//! Aggregate numbers for the admin dashboard.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::registration::Registration;
use crate::types::{
    AgeBucket, ExperienceLevel, Package, PaymentStatus, RegistrationStatus, ShirtSize,
};

/// Number of registrations listed under "recent".
pub const RECENT_LIMIT: usize = 5;

/// Dashboard figures computed from the full registrations list.
///
/// Distributions only count active (non-cancelled) registrations and always
/// contain an entry for every variant, so each one sums to `active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub active: usize,
    pub by_status: BTreeMap<RegistrationStatus, usize>,
    pub by_package: BTreeMap<Package, usize>,
    pub by_payment: BTreeMap<PaymentStatus, usize>,
    pub by_size: BTreeMap<ShirtSize, usize>,
    pub by_age: BTreeMap<AgeBucket, usize>,
    pub by_experience: BTreeMap<ExperienceLevel, usize>,
    /// Money received from active registrations.
    pub revenue: Decimal,
    /// Money still owed by active registrations.
    pub outstanding: Decimal,
    pub photo_consents: usize,
    /// Newest registrations first.
    pub recent: Vec<Registration>,
}

fn zeroed<K: Ord + Copy>(keys: &[K]) -> BTreeMap<K, usize> {
    keys.iter().map(|k| (*k, 0)).collect()
}

fn bump<K: Ord>(map: &mut BTreeMap<K, usize>, key: K) {
    *map.entry(key).or_default() += 1;
}

impl DashboardStats {
    /// Compute every figure in a single pass.
    ///
    /// `today` is the reference date for age buckets.
    #[must_use]
    pub fn compute(registrations: &[Registration], today: NaiveDate) -> Self {
        let mut stats = Self {
            total: registrations.len(),
            active: 0,
            by_status: zeroed(RegistrationStatus::ALL),
            by_package: zeroed(Package::ALL),
            by_payment: zeroed(PaymentStatus::ALL),
            by_size: zeroed(ShirtSize::ALL),
            by_age: zeroed(AgeBucket::ALL),
            by_experience: zeroed(ExperienceLevel::ALL),
            revenue: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            photo_consents: 0,
            recent: Vec::new(),
        };

        for r in registrations {
            bump(&mut stats.by_status, r.status);
            if !r.is_active() {
                continue;
            }

            stats.active += 1;
            bump(&mut stats.by_package, r.package);
            bump(&mut stats.by_payment, r.payment_status);
            bump(&mut stats.by_size, r.shirt_size);
            bump(&mut stats.by_age, r.age_bucket_on(today));
            bump(&mut stats.by_experience, r.experience);
            stats.revenue += r.amount_paid;
            stats.outstanding += r.amount_due();
            if r.photo_consent {
                stats.photo_consents += 1;
            }
        }

        let mut recent: Vec<&Registration> = registrations.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        stats.recent = recent.into_iter().take(RECENT_LIMIT).cloned().collect();

        stats
    }

    /// Percentage of active registrations for a count, rounded down.
    #[must_use]
    pub fn share_of_active(&self, count: usize) -> usize {
        if self.active == 0 {
            0
        } else {
            count * 100 / self.active
        }
    }
}
