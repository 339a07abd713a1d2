//! Document checklist tracker.
//!
//! Seeded from a fixed catalog when the transaction opens. Statuses are set
//! by the agent in any direction; the checklist informs but does not block
//! stage commits unless strict gating is switched on.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealflow_core::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Caderneta predial.
    PropertyTaxRecord,
    /// Certidão permanente.
    LandRegistryCertificate,
    /// Licença de utilização.
    HabitationLicence,
    EnergyCertificate,
    PartiesIdentification,
    /// Ficha técnica da habitação.
    TechnicalHousingSheet,
    FloorPlan,
    CondominiumDebtDeclaration,
    MortgageApprovalLetter,
}

impl DocumentType {
    /// Catalog order, which is also the checklist order.
    pub const CATALOG: [DocumentType; 9] = [
        DocumentType::PropertyTaxRecord,
        DocumentType::LandRegistryCertificate,
        DocumentType::HabitationLicence,
        DocumentType::EnergyCertificate,
        DocumentType::PartiesIdentification,
        DocumentType::TechnicalHousingSheet,
        DocumentType::FloorPlan,
        DocumentType::CondominiumDebtDeclaration,
        DocumentType::MortgageApprovalLetter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::PropertyTaxRecord => "property_tax_record",
            DocumentType::LandRegistryCertificate => "land_registry_certificate",
            DocumentType::HabitationLicence => "habitation_licence",
            DocumentType::EnergyCertificate => "energy_certificate",
            DocumentType::PartiesIdentification => "parties_identification",
            DocumentType::TechnicalHousingSheet => "technical_housing_sheet",
            DocumentType::FloorPlan => "floor_plan",
            DocumentType::CondominiumDebtDeclaration => "condominium_debt_declaration",
            DocumentType::MortgageApprovalLetter => "mortgage_approval_letter",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentType::PropertyTaxRecord => "Caderneta predial",
            DocumentType::LandRegistryCertificate => "Certidão permanente",
            DocumentType::HabitationLicence => "Licença de utilização",
            DocumentType::EnergyCertificate => "Certificado energético",
            DocumentType::PartiesIdentification => "Identificação dos intervenientes",
            DocumentType::TechnicalHousingSheet => "Ficha técnica da habitação",
            DocumentType::FloorPlan => "Planta do imóvel",
            DocumentType::CondominiumDebtDeclaration => "Declaração de não dívida ao condomínio",
            DocumentType::MortgageApprovalLetter => "Aprovação do crédito habitação",
        }
    }

    pub fn required(self) -> bool {
        matches!(
            self,
            DocumentType::PropertyTaxRecord
                | DocumentType::LandRegistryCertificate
                | DocumentType::HabitationLicence
                | DocumentType::EnergyCertificate
                | DocumentType::PartiesIdentification
        )
    }
}

impl core::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::CATALOG
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown document type: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Received,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub label: String,
    pub required: bool,
    pub status: DocumentStatus,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl DocumentEntry {
    fn seeded(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            label: doc_type.label().to_string(),
            required: doc_type.required(),
            status: DocumentStatus::Pending,
            uploaded_at: None,
            notes: None,
        }
    }

    /// `uploaded_at` is stamped the first time the entry leaves `pending`,
    /// kept while moving between `received` and `verified`, and cleared when
    /// the entry goes back to `pending`.
    fn set_status(&mut self, status: DocumentStatus, notes: Option<String>, at: DateTime<Utc>) {
        self.uploaded_at = match status {
            DocumentStatus::Pending => None,
            DocumentStatus::Received | DocumentStatus::Verified => self.uploaded_at.or(Some(at)),
        };
        self.status = status;
        if notes.is_some() {
            self.notes = notes;
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.status != DocumentStatus::Pending
    }
}

/// Ordered per-transaction document list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentChecklist(Vec<DocumentEntry>);

impl DocumentChecklist {
    pub fn seeded() -> Self {
        Self(DocumentType::CATALOG.into_iter().map(DocumentEntry::seeded).collect())
    }

    pub fn entries(&self) -> &[DocumentEntry] {
        &self.0
    }

    pub fn entry(&self, doc_type: DocumentType) -> Option<&DocumentEntry> {
        self.0.iter().find(|e| e.doc_type == doc_type)
    }

    pub fn ensure_tracked(&self, doc_type: DocumentType) -> DomainResult<()> {
        match self.entry(doc_type) {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(format!("document {doc_type} is not on this checklist"))),
        }
    }

    /// Required documents still `pending`, in checklist order.
    pub fn missing_required(&self) -> Vec<DocumentType> {
        self.0
            .iter()
            .filter(|e| e.required && !e.is_satisfied())
            .map(|e| e.doc_type)
            .collect()
    }

    pub fn set_status(
        &mut self,
        doc_type: DocumentType,
        status: DocumentStatus,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) {
        if let Some(entry) = self.0.iter_mut().find(|e| e.doc_type == doc_type) {
            entry.set_status(status, notes, at);
        }
    }
}

impl Default for DocumentChecklist {
    fn default() -> Self {
        Self::seeded()
    }
}
