//! Filtering, sorting and pagination for the admin registrations table.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::registration::Registration;
use crate::types::status::{ParseEnumError, string_enum};
use crate::types::{
    AgeBucket, ExperienceLevel, Package, PaymentStatus, RegistrationStatus, ShirtSize,
};

/// Default number of rows per page.
pub const DEFAULT_PER_PAGE: usize = 20;

/// Payment predicate: an exact payment status, or any remaining balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFilter {
    Status(PaymentStatus),
    /// Anything still owed, regardless of status.
    Outstanding,
}

impl PaymentFilter {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status(status) => status.as_str(),
            Self::Outstanding => "outstanding",
        }
    }

    fn matches(self, registration: &Registration) -> bool {
        match self {
            Self::Status(status) => registration.payment_status == status,
            Self::Outstanding => !registration.amount_due().is_zero(),
        }
    }
}

impl fmt::Display for PaymentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "outstanding" {
            return Ok(Self::Outstanding);
        }
        s.parse::<PaymentStatus>()
            .map(Self::Status)
            .map_err(|_| ParseEnumError {
                kind: "PaymentFilter",
                value: s.to_string(),
            })
    }
}

string_enum! {
    /// Column the table is sorted by.
    pub enum SortKey {
        CreatedAt => ("created_at", "Registration date"),
        CamperName => ("camper_name", "Camper"),
        Age => ("age", "Age"),
        AmountDue => ("amount_due", "Amount due"),
    }
}

string_enum! {
    pub enum SortDirection {
        Asc => ("asc", "Ascending"),
        Desc => ("desc", "Descending"),
    }
}

impl SortDirection {
    /// The opposite direction, for clickable column headers.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Every predicate the registrations table can filter on.
///
/// Unset fields match everything; set fields are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    pub package: Option<Package>,
    pub payment: Option<PaymentFilter>,
    pub size: Option<ShirtSize>,
    pub experience: Option<ExperienceLevel>,
    pub age_bucket: Option<AgeBucket>,
    /// First creation day included.
    pub created_from: Option<NaiveDate>,
    /// Last creation day included.
    pub created_to: Option<NaiveDate>,
    pub has_notes: Option<bool>,
    /// Case-insensitive text matched against camper name, parent name and
    /// parent email.
    pub search: Option<String>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl Default for RegistrationFilter {
    fn default() -> Self {
        Self {
            status: None,
            package: None,
            payment: None,
            size: None,
            experience: None,
            age_bucket: None,
            created_from: None,
            created_to: None,
            has_notes: None,
            search: None,
            sort: SortKey::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl RegistrationFilter {
    /// Search text trimmed and lower-cased, if non-empty.
    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Number of predicates currently set (sorting excluded).
    #[must_use]
    pub fn active_count(&self) -> usize {
        [
            self.status.is_some(),
            self.package.is_some(),
            self.payment.is_some(),
            self.size.is_some(),
            self.experience.is_some(),
            self.age_bucket.is_some(),
            self.created_from.is_some(),
            self.created_to.is_some(),
            self.has_notes.is_some(),
            self.search_needle().is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Whether a single registration satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, registration: &Registration, today: NaiveDate) -> bool {
        self.matches_with(registration, today, self.search_needle().as_deref())
    }

    fn matches_with(
        &self,
        r: &Registration,
        today: NaiveDate,
        needle: Option<&str>,
    ) -> bool {
        let created = r.created_at.date_naive();

        self.status.is_none_or(|s| r.status == s)
            && self.package.is_none_or(|p| r.package == p)
            && self.payment.is_none_or(|p| p.matches(r))
            && self.size.is_none_or(|s| r.shirt_size == s)
            && self.experience.is_none_or(|e| r.experience == e)
            && self.age_bucket.is_none_or(|b| r.age_bucket_on(today) == b)
            && self.created_from.is_none_or(|from| created >= from)
            && self.created_to.is_none_or(|to| created <= to)
            && self.has_notes.is_none_or(|wanted| r.has_notes() == wanted)
            && needle.is_none_or(|n| {
                r.camper_name().to_lowercase().contains(n)
                    || r.parent_name().to_lowercase().contains(n)
                    || r.parent_email.as_str().contains(n)
            })
    }

    fn compare(&self, a: &Registration, b: &Registration, today: NaiveDate) -> Ordering {
        let ordering = match self.sort {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::CamperName => a
                .camper_last_name
                .to_lowercase()
                .cmp(&b.camper_last_name.to_lowercase())
                .then_with(|| {
                    a.camper_first_name
                        .to_lowercase()
                        .cmp(&b.camper_first_name.to_lowercase())
                }),
            SortKey::Age => a.age_on(today).cmp(&b.age_on(today)),
            SortKey::AmountDue => a.amount_due().cmp(&b.amount_due()),
        };
        let ordering = match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        // Stable tie-break so pages never shuffle between requests
        ordering.then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// Filter and sort registrations.
///
/// `today` is the date used to compute age buckets and age sorting.
#[must_use]
pub fn apply<'a>(
    registrations: &'a [Registration],
    filter: &RegistrationFilter,
    today: NaiveDate,
) -> Vec<&'a Registration> {
    let needle = filter.search_needle();
    let mut rows: Vec<&Registration> = registrations
        .iter()
        .filter(|r| filter.matches_with(r, today, needle.as_deref()))
        .collect();
    rows.sort_by(|a, b| filter.compare(a, b, today));
    rows
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Current page, 1-based.
    pub page: usize,
    pub per_page: usize,
    /// Number of items across all pages.
    pub total: usize,
    /// Always at least 1, so an empty result still has a page to render.
    pub total_pages: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// 1-based index of the first item shown, 0 when empty.
    #[must_use]
    pub const fn first_index(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last item shown.
    #[must_use]
    pub const fn last_index(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slice `items` into a page.
///
/// Page 0 is treated as 1 and pages past the end clamp to the last page.
/// A `per_page` of 0 falls back to [`DEFAULT_PER_PAGE`].
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}
