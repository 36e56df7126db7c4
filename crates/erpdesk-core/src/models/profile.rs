use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::api::wire::WireProfile;

/// A user profile as held in the roster.
///
/// Deserialization always goes through [`WireProfile`], so every record that
/// enters the process has its blood group resolved to the single
/// `blood_group` field. Serialization produces the server's request shape
/// (`bloodGroup`, camelCase keys).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireProfile")]
pub struct UserRecord {
    pub id: String,
    pub name: PersonName,
    pub email: String,
    pub username: String,
    pub password: String,
    pub date_of_birth: String,
    #[serde(serialize_with = "blood_group_or_empty")]
    pub blood_group: Option<String>,
    pub address: Address,
    pub phone: String,
    pub account_created: String,
    pub last_login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

fn blood_group_or_empty<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

impl UserRecord {
    /// Empty add-user template. Timestamps are stamped with the current time.
    pub fn blank_template() -> Self {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            account_created: now.clone(),
            last_login: now,
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.first, self.name.last).trim().to_string()
    }

    /// Two-letter avatar initials, e.g. "JD"
    pub fn initials(&self) -> String {
        self.name.first.chars().take(1)
            .chain(self.name.last.chars().take(1))
            .collect::<String>()
            .to_uppercase()
    }

    pub fn blood_group_display(&self) -> &str {
        self.blood_group.as_deref().unwrap_or("")
    }
}

/// The two built-in profiles used whenever the profile service is empty or
/// unreachable.
pub fn seed_profiles() -> Vec<UserRecord> {
    vec![
        UserRecord {
            id: "123456".to_string(),
            name: PersonName {
                first: "John".to_string(),
                last: "Doe".to_string(),
            },
            email: "john.doe@example.com".to_string(),
            username: "johndoe".to_string(),
            password: "asqw123".to_string(),
            date_of_birth: "1990-05-15".to_string(),
            blood_group: Some("o+ve".to_string()),
            address: Address {
                street: "123 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                postal_code: "62704".to_string(),
                country: "USA".to_string(),
            },
            phone: "+1-555-123-4567".to_string(),
            account_created: "2023-08-01T14:30:00Z".to_string(),
            last_login: "2025-05-19T09:15:00Z".to_string(),
        },
        UserRecord {
            id: "789012".to_string(),
            name: PersonName {
                first: "Jane".to_string(),
                last: "Smith".to_string(),
            },
            email: "jane.smith@example.com".to_string(),
            username: "janesmith".to_string(),
            password: "qwerty123".to_string(),
            date_of_birth: "1988-03-20".to_string(),
            blood_group: Some("b+ve".to_string()),
            address: Address {
                street: "456 Oak Ave".to_string(),
                city: "Boston".to_string(),
                state: "MA".to_string(),
                postal_code: "02108".to_string(),
                country: "USA".to_string(),
            },
            phone: "+1-555-987-6543".to_string(),
            account_created: "2023-09-15T10:20:00Z".to_string(),
            last_login: "2025-05-18T15:45:00Z".to_string(),
        },
    ]
}

// ============================================================================
// Editable fields
// ============================================================================

/// Sections of the profile form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSection {
    Personal,
    Address,
    Account,
}

impl FormSection {
    pub fn title(&self) -> &'static str {
        match self {
            FormSection::Personal => "Personal",
            FormSection::Address => "Address",
            FormSection::Account => "Account",
        }
    }

    /// Get the next section (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            FormSection::Personal => FormSection::Address,
            FormSection::Address => FormSection::Account,
            FormSection::Account => FormSection::Personal,
        }
    }

    /// Get the previous section (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            FormSection::Personal => FormSection::Account,
            FormSection::Address => FormSection::Personal,
            FormSection::Account => FormSection::Address,
        }
    }

    pub fn fields(&self) -> &'static [ProfileField] {
        match self {
            FormSection::Personal => &[
                ProfileField::FirstName,
                ProfileField::LastName,
                ProfileField::Username,
                ProfileField::Email,
                ProfileField::DateOfBirth,
                ProfileField::BloodGroup,
            ],
            FormSection::Address => &[
                ProfileField::Phone,
                ProfileField::Street,
                ProfileField::City,
                ProfileField::State,
                ProfileField::PostalCode,
                ProfileField::Country,
            ],
            FormSection::Account => &[ProfileField::AccountCreated, ProfileField::LastLogin],
        }
    }
}

/// One editable attribute of a [`UserRecord`], addressed the same way the
/// web form named its inputs (`name.first`, `address.city`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    FirstName,
    LastName,
    Username,
    Email,
    Password,
    DateOfBirth,
    BloodGroup,
    Phone,
    Street,
    City,
    State,
    PostalCode,
    Country,
    AccountCreated,
    LastLogin,
}

impl ProfileField {
    /// Fields shown in the add-user form, in display order.
    pub const ADD_FORM: [ProfileField; 13] = [
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::Username,
        ProfileField::Email,
        ProfileField::Password,
        ProfileField::BloodGroup,
        ProfileField::Phone,
        ProfileField::DateOfBirth,
        ProfileField::Street,
        ProfileField::City,
        ProfileField::State,
        ProfileField::PostalCode,
        ProfileField::Country,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::FirstName => "First Name",
            ProfileField::LastName => "Last Name",
            ProfileField::Username => "Username",
            ProfileField::Email => "Email",
            ProfileField::Password => "Password",
            ProfileField::DateOfBirth => "Date of Birth",
            ProfileField::BloodGroup => "Blood Group",
            ProfileField::Phone => "Phone",
            ProfileField::Street => "Street Address",
            ProfileField::City => "City",
            ProfileField::State => "State",
            ProfileField::PostalCode => "Postal Code",
            ProfileField::Country => "Country",
            ProfileField::AccountCreated => "Account Created",
            ProfileField::LastLogin => "Last Login",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, ProfileField::Password)
    }

    pub fn get<'a>(&self, record: &'a UserRecord) -> &'a str {
        match self {
            ProfileField::FirstName => &record.name.first,
            ProfileField::LastName => &record.name.last,
            ProfileField::Username => &record.username,
            ProfileField::Email => &record.email,
            ProfileField::Password => &record.password,
            ProfileField::DateOfBirth => &record.date_of_birth,
            ProfileField::BloodGroup => record.blood_group_display(),
            ProfileField::Phone => &record.phone,
            ProfileField::Street => &record.address.street,
            ProfileField::City => &record.address.city,
            ProfileField::State => &record.address.state,
            ProfileField::PostalCode => &record.address.postal_code,
            ProfileField::Country => &record.address.country,
            ProfileField::AccountCreated => &record.account_created,
            ProfileField::LastLogin => &record.last_login,
        }
    }

    /// Mutable access to the backing string. The blood group is optional, so
    /// it is materialized as an empty string first.
    fn slot<'a>(&self, record: &'a mut UserRecord) -> &'a mut String {
        match self {
            ProfileField::FirstName => &mut record.name.first,
            ProfileField::LastName => &mut record.name.last,
            ProfileField::Username => &mut record.username,
            ProfileField::Email => &mut record.email,
            ProfileField::Password => &mut record.password,
            ProfileField::DateOfBirth => &mut record.date_of_birth,
            ProfileField::BloodGroup => record.blood_group.get_or_insert_with(String::new),
            ProfileField::Phone => &mut record.phone,
            ProfileField::Street => &mut record.address.street,
            ProfileField::City => &mut record.address.city,
            ProfileField::State => &mut record.address.state,
            ProfileField::PostalCode => &mut record.address.postal_code,
            ProfileField::Country => &mut record.address.country,
            ProfileField::AccountCreated => &mut record.account_created,
            ProfileField::LastLogin => &mut record.last_login,
        }
    }

    pub fn set(&self, record: &mut UserRecord, value: String) {
        *self.slot(record) = value;
        self.tidy(record);
    }

    pub fn push_char(&self, record: &mut UserRecord, c: char) {
        self.slot(record).push(c);
    }

    pub fn pop_char(&self, record: &mut UserRecord) {
        self.slot(record).pop();
        self.tidy(record);
    }

    /// An emptied blood group goes back to absent
    fn tidy(&self, record: &mut UserRecord) {
        if *self == ProfileField::BloodGroup && record.blood_group.as_deref() == Some("") {
            record.blood_group = None;
        }
    }
}
