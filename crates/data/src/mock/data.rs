//! Static demo dataset.
//!
//! Eight registrations covering every status, package and payment state,
//! three gallery collections with twelve photos, two admin users and a couple
//! of contact requests. Dates sit in the 2026 season so age buckets line up
//! with a June camp start.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use summer_camp_core::{
    AdminRole, AdminUser, AdminUserId, CollectionId, CollectionType, ContactSubmission,
    ContactSubmissionId, Email, ExperienceLevel, FiscalCode, GalleryCollection, GalleryPhoto,
    Gender, NewRegistration, Package, PaymentOption, PaymentStatus, PhoneNumber, PhotoId,
    Registration, RegistrationId, RegistrationStatus, ShirtSize,
};

/// Emails accepted by the demo login.
pub const DEMO_ADMIN_EMAIL: &str = "admin@summercamp.example";
pub const DEMO_SUBADMIN_EMAIL: &str = "staff@summercamp.example";

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn email(s: &str) -> Email {
    Email::parse(s).expect("demo email is valid")
}

fn phone(s: &str) -> PhoneNumber {
    PhoneNumber::parse(s).expect("demo phone is valid")
}

fn fiscal(s: &str) -> FiscalCode {
    FiscalCode::parse(s).expect("demo fiscal code is valid")
}

struct Camper {
    n: u128,
    first: &'static str,
    last: &'static str,
    born: NaiveDate,
    fiscal_code: &'static str,
    gender: Gender,
    size: ShirtSize,
    experience: ExperienceLevel,
    parent_first: &'static str,
    parent_fiscal_code: &'static str,
    parent_phone: &'static str,
    emergency_phone: &'static str,
    package: Package,
    option: PaymentOption,
    created: DateTime<Utc>,
}

impl Camper {
    fn build(self) -> Registration {
        let new = NewRegistration {
            camper_first_name: self.first.to_string(),
            camper_last_name: self.last.to_string(),
            camper_birth_date: self.born,
            camper_birth_place: "Roma".to_string(),
            camper_fiscal_code: fiscal(self.fiscal_code),
            camper_gender: self.gender,
            shirt_size: self.size,
            experience: self.experience,
            club: None,
            allergies: None,
            medical_notes: None,
            parent_first_name: self.parent_first.to_string(),
            parent_last_name: self.last.to_string(),
            parent_email: email(&format!(
                "{}.{}@example.com",
                self.parent_first.to_lowercase(),
                self.last.to_lowercase()
            )),
            parent_phone: phone(self.parent_phone),
            parent_fiscal_code: fiscal(self.parent_fiscal_code),
            address: "Via del Mare 12".to_string(),
            city: "Roma".to_string(),
            postal_code: "00122".to_string(),
            emergency_name: format!("Nonna {}", self.last),
            emergency_phone: phone(self.emergency_phone),
            emergency_relationship: "Grandmother".to_string(),
            package: self.package,
            payment_option: self.option,
            privacy_consent: true,
            regulations_consent: true,
            photo_consent: false,
        };
        Registration::from_new(
            RegistrationId::from_uuid(Uuid::from_u128(0x5c00_0000 + self.n)),
            new,
            self.created,
        )
    }
}

/// The demo registrations, newest last.
#[must_use]
pub fn registrations() -> Vec<Registration> {
    let mut luca = Camper {
        n: 1,
        first: "Luca",
        last: "Rossi",
        born: date(2014, 3, 10),
        fiscal_code: "RSSLCU14C10H501X",
        gender: Gender::Male,
        size: ShirtSize::M,
        experience: ExperienceLevel::Intermediate,
        parent_first: "Marco",
        parent_fiscal_code: "RSSMRC80A01H501Z",
        parent_phone: "+39 333 1234567",
        emergency_phone: "+39 333 7654321",
        package: Package::Standard,
        option: PaymentOption::Deposit,
        created: at(2026, 2, 3, 9),
    }
    .build();
    luca.status = RegistrationStatus::Confirmed;
    luca.payment_status = PaymentStatus::DepositPaid;
    luca.amount_paid = Decimal::new(150, 0);
    luca.paid_session_ids = vec!["cs_demo_luca".to_string()];

    let mut giulia = Camper {
        n: 2,
        first: "Giulia",
        last: "Bianchi",
        born: date(2017, 7, 22),
        fiscal_code: "BNCGLI17L62F205Y",
        gender: Gender::Female,
        size: ShirtSize::S,
        experience: ExperienceLevel::Beginner,
        parent_first: "Laura",
        parent_fiscal_code: "BNCLRA82M41F205W",
        parent_phone: "347 5551234",
        emergency_phone: "347 5554321",
        package: Package::HighSpecialization,
        option: PaymentOption::Full,
        created: at(2026, 2, 14, 18),
    }
    .build();
    giulia.status = RegistrationStatus::Confirmed;
    giulia.payment_status = PaymentStatus::Paid;
    giulia.amount_paid = Decimal::new(540, 0);
    giulia.photo_consent = true;
    giulia.notes = Some("Vegetarian meals".to_string());

    let mut matteo = Camper {
        n: 3,
        first: "Matteo",
        last: "Conti",
        born: date(2011, 11, 2),
        fiscal_code: "CNTMTT11S02L219Q",
        gender: Gender::Male,
        size: ShirtSize::Xl,
        experience: ExperienceLevel::Advanced,
        parent_first: "Paolo",
        parent_fiscal_code: "CNTPLA75B12L219D",
        parent_phone: "340 1112233",
        emergency_phone: "340 3332211",
        package: Package::HighSpecialization,
        option: PaymentOption::Deposit,
        created: at(2026, 5, 20, 11),
    }
    .build();
    matteo.club = Some("Volley Ostia".to_string());

    let mut sofia = Camper {
        n: 4,
        first: "Sofia",
        last: "Ricci",
        born: date(2019, 1, 15),
        fiscal_code: "RCCSFO19A55H501R",
        gender: Gender::Female,
        size: ShirtSize::Xs,
        experience: ExperienceLevel::Beginner,
        parent_first: "Elena",
        parent_fiscal_code: "RCCLNE85C50H501P",
        parent_phone: "328 4445566",
        emergency_phone: "328 6655444",
        package: Package::Standard,
        option: PaymentOption::Full,
        created: at(2026, 5, 28, 15),
    }
    .build();
    sofia.allergies = Some("Bee stings".to_string());
    sofia.photo_consent = true;

    let mut alessandro = Camper {
        n: 5,
        first: "Alessandro",
        last: "Greco",
        born: date(2009, 5, 30),
        fiscal_code: "GRCLSN09E30F839T",
        gender: Gender::Male,
        size: ShirtSize::L,
        experience: ExperienceLevel::Advanced,
        parent_first: "Davide",
        parent_fiscal_code: "GRCDVD70H10F839U",
        parent_phone: "339 7778899",
        emergency_phone: "339 9988777",
        package: Package::Standard,
        option: PaymentOption::Full,
        created: at(2026, 3, 2, 10),
    }
    .build();
    alessandro.status = RegistrationStatus::Cancelled;
    alessandro.payment_status = PaymentStatus::Refunded;
    alessandro.notes = Some("Withdrew after a knee injury, refund issued".to_string());

    let mut chiara = Camper {
        n: 6,
        first: "Chiara",
        last: "Marino",
        born: date(2013, 9, 8),
        fiscal_code: "MRNCHR13P48A944S",
        gender: Gender::Female,
        size: ShirtSize::M,
        experience: ExperienceLevel::Intermediate,
        parent_first: "Francesca",
        parent_fiscal_code: "MRNFNC78T55A944B",
        parent_phone: "335 2223344",
        emergency_phone: "335 4433222",
        package: Package::HighSpecialization,
        option: PaymentOption::Deposit,
        created: at(2026, 3, 18, 20),
    }
    .build();
    chiara.status = RegistrationStatus::Confirmed;
    chiara.payment_status = PaymentStatus::DepositPaid;
    chiara.amount_paid = Decimal::new(200, 0);
    chiara.photo_consent = true;

    let mut lorenzo = Camper {
        n: 7,
        first: "Lorenzo",
        last: "Gallo",
        born: date(2016, 4, 18),
        fiscal_code: "GLLLNZ16D18G273E",
        gender: Gender::Male,
        size: ShirtSize::S,
        experience: ExperienceLevel::Beginner,
        parent_first: "Stefano",
        parent_fiscal_code: "GLLSFN80R20G273H",
        parent_phone: "366 9990011",
        emergency_phone: "366 1100999",
        package: Package::Standard,
        option: PaymentOption::Deposit,
        created: at(2026, 4, 9, 8),
    }
    .build();
    lorenzo.reminder_sent_at = Some(at(2026, 5, 1, 9));

    let mut martina = Camper {
        n: 8,
        first: "Martina",
        last: "Costa",
        born: date(2012, 12, 1),
        fiscal_code: "CSTMTN12T41D612L",
        gender: Gender::Female,
        size: ShirtSize::Xxl,
        experience: ExperienceLevel::Intermediate,
        parent_first: "Roberto",
        parent_fiscal_code: "CSTRRT72A01D612N",
        parent_phone: "348 6667788",
        emergency_phone: "348 8877666",
        package: Package::Standard,
        option: PaymentOption::Full,
        created: at(2026, 4, 22, 13),
    }
    .build();
    martina.status = RegistrationStatus::Confirmed;
    martina.payment_status = PaymentStatus::Paid;
    martina.amount_paid = Decimal::new(390, 0);
    martina.paid_session_ids = vec!["cs_demo_martina".to_string()];

    let mut all = vec![
        luca, giulia, matteo, sofia, alessandro, chiara, lorenzo, martina,
    ];
    for r in &mut all {
        r.updated_at = r.reminder_sent_at.unwrap_or(r.created_at);
    }
    all.sort_by_key(|r| r.created_at);
    all
}

/// The demo gallery collections.
#[must_use]
pub fn collections() -> Vec<GalleryCollection> {
    let collection =
        |id: i32, name: &str, slug: &str, year: i32, kind: CollectionType, text: &str| {
            GalleryCollection {
                id: CollectionId::new(id),
                name: name.to_string(),
                slug: slug.to_string(),
                year: Some(year),
                collection_type: kind,
                description: Some(text.to_string()),
                created_at: at(year, 9, 1, 12),
            }
        };

    vec![
        collection(
            1,
            "Camp 2024",
            "camp-2024",
            2024,
            CollectionType::Camp,
            "A week of beach volley, swimming and friendship.",
        ),
        collection(
            2,
            "Camp 2025",
            "camp-2025",
            2025,
            CollectionType::Camp,
            "Our biggest edition so far.",
        ),
        collection(
            3,
            "Torneo di Natale 2025",
            "torneo-di-natale-2025",
            2025,
            CollectionType::Event,
            "The winter tournament for camp alumni.",
        ),
    ]
}

/// The demo gallery photos.
#[must_use]
pub fn photos() -> Vec<GalleryPhoto> {
    // (collection, sort order, featured, alt text)
    let rows: [(i32, i32, bool, &str); 12] = [
        (1, 0, true, "Warm-up on the beach"),
        (1, 1, false, "Serve practice"),
        (1, 2, false, "Team photo"),
        (1, 3, false, "Lunch break"),
        (2, 0, false, "Opening day"),
        (2, 1, true, "Final match"),
        (2, 2, false, "Coaches clinic"),
        (2, 3, false, "Pool afternoon"),
        (2, 4, true, "Award ceremony"),
        (3, 0, false, "Bracket board"),
        (3, 1, false, "Block at the net"),
        (3, 2, false, "Winners"),
    ];

    rows.iter()
        .zip(1..)
        .map(|(&(collection, sort_order, featured, alt), id)| {
            let year = if collection == 1 { 2024 } else { 2025 };
            GalleryPhoto {
                id: PhotoId::new(id),
                collection_id: Some(CollectionId::new(collection)),
                url: format!("https://picsum.photos/seed/summer-camp-{id}/1200/800"),
                alt_text: alt.to_string(),
                category: Some(if collection == 3 { "tournament" } else { "camp" }.to_string()),
                year: Some(year),
                sort_order,
                featured,
                created_at: at(year, 9, 2, 12),
            }
        })
        .collect()
}

/// The demo admin users.
#[must_use]
pub fn admin_users() -> Vec<AdminUser> {
    vec![
        AdminUser {
            id: AdminUserId::new(1),
            email: email(DEMO_ADMIN_EMAIL),
            role: AdminRole::Admin,
            created_at: at(2025, 11, 1, 9),
            created_by: None,
        },
        AdminUser {
            id: AdminUserId::new(2),
            email: email(DEMO_SUBADMIN_EMAIL),
            role: AdminRole::Subadmin,
            created_at: at(2025, 11, 15, 9),
            created_by: Some(email(DEMO_ADMIN_EMAIL)),
        },
    ]
}

/// The demo contact requests.
#[must_use]
pub fn contact_submissions() -> Vec<ContactSubmission> {
    vec![
        ContactSubmission {
            id: ContactSubmissionId::new(1),
            name: "Valentina Moretti".to_string(),
            email: email("valentina.moretti@example.com"),
            phone: Some(phone("+39 320 1234567")),
            message: "Is there a discount for siblings?".to_string(),
            created_at: at(2026, 4, 2, 17),
        },
        ContactSubmission {
            id: ContactSubmissionId::new(2),
            name: "Andrea Ferri".to_string(),
            email: email("andrea.ferri@example.com"),
            phone: None,
            message: "Can my son join for only three days?".to_string(),
            created_at: at(2026, 5, 11, 10),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_registrations_cover_every_state() {
        let regs = registrations();
        assert_eq!(regs.len(), 8);

        let statuses: HashSet<_> = regs.iter().map(|r| r.status).collect();
        let packages: HashSet<_> = regs.iter().map(|r| r.package).collect();
        let payments: HashSet<_> = regs.iter().map(|r| r.payment_status).collect();
        assert_eq!(statuses.len(), RegistrationStatus::ALL.len());
        assert_eq!(packages.len(), Package::ALL.len());
        assert_eq!(payments.len(), PaymentStatus::ALL.len());

        let ids: HashSet<_> = regs.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), regs.len());
    }

    #[test]
    fn test_payment_state_matches_amounts() {
        for r in registrations() {
            match r.payment_status {
                PaymentStatus::Paid => assert!(r.amount_due().is_zero(), "{}", r.camper_name()),
                PaymentStatus::DepositPaid => {
                    assert_eq!(r.amount_paid, r.package.deposit(), "{}", r.camper_name());
                }
                PaymentStatus::Unpaid | PaymentStatus::Refunded => {
                    assert!(r.amount_paid.is_zero(), "{}", r.camper_name());
                }
            }
        }
    }

    #[test]
    fn test_campers_fit_age_range() {
        let camp_start = date(2026, 6, 15);
        for r in registrations() {
            let age = r.age_on(camp_start);
            assert!((6..=17).contains(&age), "{} is {age}", r.camper_name());
        }
    }

    #[test]
    fn test_gallery_references_are_consistent() {
        let collections = collections();
        let photos = photos();
        assert_eq!(collections.len(), 3);
        assert_eq!(photos.len(), 12);

        let collection_ids: HashSet<_> = collections.iter().map(|c| c.id).collect();
        assert!(photos
            .iter()
            .all(|p| p.collection_id.is_some_and(|id| collection_ids.contains(&id))));
        assert!(photos.iter().any(|p| p.featured));
    }

    #[test]
    fn test_admin_users() {
        let admins = admin_users();
        assert_eq!(admins.len(), 2);
        assert_eq!(admins[0].role, AdminRole::Admin);
        assert_eq!(admins[1].created_by.as_ref().unwrap().as_str(), DEMO_ADMIN_EMAIL);
    }
}
