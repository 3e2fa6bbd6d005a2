//! SnelStart API data transfer objects
//!
//! Field names follow the API (Dutch, camelCase). Only the fields the order
//! pipeline reads or writes are modelled; unknown response fields are
//! ignored.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Reference to another SnelStart resource (`{"id": "..."}`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdRef {
    pub id: String,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Processing status of a sales order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProcesStatus {
    /// Quote
    Offerte,
    /// Order
    #[default]
    Order,
    /// Work order
    Werkbon,
    /// Invoiced
    Factuur,
    /// Cash sale
    Contant,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

impl ProcesStatus {
    /// Invoiced orders must not be changed locally
    pub fn is_invoiced(&self) -> bool {
        matches!(self, Self::Factuur)
    }
}

/// How VAT is entered on order lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BtwIngaveModel {
    /// Prices include VAT
    #[default]
    Inclusief,
    /// Prices exclude VAT
    Exclusief,
}

/// Sales order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerkooporderRegel {
    pub artikel: IdRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omschrijving: Option<String>,
    /// Unit price
    pub stuksprijs: f64,
    /// Quantity
    pub aantal: f64,
}

/// POST /verkooporders body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerkooporderCreate {
    /// Customer
    pub relatie: IdRef,
    /// Order date, time truncated to 00:00:00
    pub datum: NaiveDateTime,
    pub proces_status: ProcesStatus,
    pub regels: Vec<VerkooporderRegel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub verkooporder_btw_ingave_model: BtwIngaveModel,
}

/// Sales order as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verkooporder {
    pub id: String,
    #[serde(default)]
    pub proces_status: ProcesStatus,
    #[serde(default)]
    pub relatie: Option<IdRef>,
    #[serde(default)]
    pub datum: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}
