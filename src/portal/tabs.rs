//! Dashboard tab selection from the `?tab=` query value.
//! Unknown or missing values select the default tab.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientTab {
    #[default]
    Profile,
    Report,
}

impl PatientTab {
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("report") => PatientTab::Report,
            _ => PatientTab::Profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorTab {
    #[default]
    Patients,
    History,
}

impl DoctorTab {
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("history") => DoctorTab::History,
            _ => DoctorTab::Patients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_fall_back_to_default() {
        assert_eq!(PatientTab::from_query(None), PatientTab::Profile);
        assert_eq!(PatientTab::from_query(Some("report")), PatientTab::Report);
        assert_eq!(PatientTab::from_query(Some("settings")), PatientTab::Profile);
        assert_eq!(DoctorTab::from_query(Some("history")), DoctorTab::History);
        assert_eq!(DoctorTab::from_query(Some("")), DoctorTab::Patients);
    }
}
