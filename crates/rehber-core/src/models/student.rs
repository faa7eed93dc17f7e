use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    /// School number
    #[serde(rename = "numara")]
    pub number: String,
    #[serde(rename = "ad")]
    pub first_name: String,
    #[serde(rename = "soyad")]
    pub last_name: String,
    #[serde(rename = "tam_ad", default)]
    pub full_name: Option<String>,
    #[serde(rename = "sinif")]
    pub class_name: String,
    #[serde(rename = "cinsiyet")]
    pub gender: String,
    #[serde(rename = "telefon", default)]
    pub phone: Option<String>,
    #[serde(rename = "eposta", default)]
    pub email: Option<String>,
    /// Overall progress percentage
    #[serde(rename = "genel_ilerleme", default)]
    pub overall_progress: f64,
}

impl Student {
    /// Display name, falling back to "first last" when the API omits `tam_ad`.
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// Body of a create or update request for `/ogrenciler`.
///
/// The server requires number, names, class and gender to be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentInput {
    #[serde(rename = "numara")]
    pub number: String,
    #[serde(rename = "ad")]
    pub first_name: String,
    #[serde(rename = "soyad")]
    pub last_name: String,
    #[serde(rename = "sinif")]
    pub class_name: String,
    #[serde(rename = "cinsiyet")]
    pub gender: String,
    #[serde(rename = "telefon", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "eposta", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&Student> for StudentInput {
    fn from(student: &Student) -> Self {
        Self {
            number: student.number.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            class_name: student.class_name.clone(),
            gender: student.gender.clone(),
            phone: student.phone.clone(),
            email: student.email.clone(),
        }
    }
}
