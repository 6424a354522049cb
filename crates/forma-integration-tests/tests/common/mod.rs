//! Record fixtures shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use forma_core::{
    Arguments, BackedEnum, ClassDecl, Direction, EnumCase, FieldDecl, FieldMap, FieldValue, Hooks,
    NamingStrategy, PostHydrate, PreHydrate, PreSerialize, Record, Result, TypeDecl, ValidationRule,
};
use forma_engine::MutableRecord;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Suspended,
}

impl BackedEnum for Status {
    const NAME: &'static str = "Status";

    fn cases() -> Vec<EnumCase> {
        vec![
            EnumCase::new("Active", "active"),
            EnumCase::new("Suspended", "suspended"),
        ]
    }

    fn case_name(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
        }
    }

    fn from_case_name(name: &str) -> Option<Self> {
        match name {
            "Active" => Some(Self::Active),
            "Suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Address: plain nested record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: Option<String>,
}

impl Record for Address {
    fn declare() -> ClassDecl {
        ClassDecl::new("Address")
            .field(FieldDecl::new("street", TypeDecl::String).rule(ValidationRule::min_length(3)))
            .field(FieldDecl::new("city", TypeDecl::String))
            .field(FieldDecl::new("zip", TypeDecl::optional(TypeDecl::String)))
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            street: args.take("street")?,
            city: args.take("city")?,
            zip: args.take("zip")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("street", &self.street)
            .with("city", &self.city)
            .with("zip", self.zip.clone())
    }
}

// ---------------------------------------------------------------------------
// User: defaults, hidden, read-only, enum, date, nested, mutable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub email: String,
    pub age: Option<i64>,
    pub status: Status,
    pub created_at: DateTime<FixedOffset>,
    pub password: Option<String>,
    pub tags: Vec<String>,
    pub address: Option<Address>,
}

impl Record for User {
    fn declare() -> ClassDecl {
        ClassDecl::new("User")
            .field(FieldDecl::new("id", TypeDecl::Int).readonly())
            .field(
                FieldDecl::new("first_name", TypeDecl::String)
                    .rule(ValidationRule::length(Some(2), Some(40))),
            )
            .field(FieldDecl::new("email", TypeDecl::String).rule(ValidationRule::email()))
            .field(
                FieldDecl::new("age", TypeDecl::optional(TypeDecl::Int))
                    .rule(ValidationRule::between(0.0, 150.0)),
            )
            .field(FieldDecl::new("status", TypeDecl::enumeration::<Status>()).default("active"))
            .field(FieldDecl::new("created_at", TypeDecl::DateTime))
            .field(FieldDecl::new("password", TypeDecl::optional(TypeDecl::String)).hidden())
            .field(
                FieldDecl::new("tags", TypeDecl::list(TypeDecl::String))
                    .default(Value::Array(Vec::new())),
            )
            .field(
                FieldDecl::new("address", TypeDecl::optional(TypeDecl::record::<Address>()))
                    .rule(ValidationRule::valid()),
            )
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            id: args.take("id")?,
            first_name: args.take("first_name")?,
            email: args.take("email")?,
            age: args.take("age")?,
            status: args.enumeration("status")?,
            created_at: args.take("created_at")?,
            password: args.take("password")?,
            tags: args.take("tags")?,
            address: args.optional_record("address")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("id", self.id)
            .with("first_name", &self.first_name)
            .with("email", &self.email)
            .with("age", self.age)
            .with("status", FieldValue::enumeration(&self.status))
            .with("created_at", self.created_at)
            .with("password", self.password.clone())
            .with("tags", self.tags.clone())
            .with("address", FieldValue::optional_record(self.address.as_ref()))
    }
}

impl MutableRecord for User {
    fn set_field(&mut self, name: &str, args: &mut Arguments) -> Result<()> {
        match name {
            "first_name" => self.first_name = args.take(name)?,
            "email" => self.email = args.take(name)?,
            "age" => self.age = args.take(name)?,
            "status" => self.status = args.enumeration(name)?,
            "created_at" => self.created_at = args.take(name)?,
            "password" => self.password = args.take(name)?,
            "tags" => self.tags = args.take(name)?,
            "address" => self.address = args.optional_record(name)?,
            _ => {}
        }
        Ok(())
    }
}

pub fn user_json() -> Value {
    serde_json::json!({
        "id": 7,
        "first_name": "Ann",
        "email": "ann@example.com",
        "age": 30,
        "status": "suspended",
        "created_at": "2024-03-01T10:30:00+00:00",
        "password": "hunter2",
        "tags": ["admin", "ops"],
        "address": {"street": "Main St 1", "city": "Lisbon", "zip": null}
    })
}

// ---------------------------------------------------------------------------
// Order: lists of nested records and lifecycle hooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub sku: String,
    pub quantity: i64,
}

impl Record for LineItem {
    fn declare() -> ClassDecl {
        ClassDecl::new("LineItem")
            .field(FieldDecl::new("sku", TypeDecl::String).rule(ValidationRule::length(Some(3), None)))
            .field(FieldDecl::new("quantity", TypeDecl::Int).rule(ValidationRule::min(1.0)))
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            sku: args.take("sku")?,
            quantity: args.take("quantity")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("sku", &self.sku)
            .with("quantity", self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub number: String,
    pub items: Vec<LineItem>,
    pub units: i64,
}

impl Record for Order {
    fn declare() -> ClassDecl {
        ClassDecl::new("Order")
            .field(FieldDecl::new("number", TypeDecl::String))
            .field(
                FieldDecl::new("items", TypeDecl::list(TypeDecl::record::<LineItem>()))
                    .rule(ValidationRule::valid_each()),
            )
            .field(FieldDecl::new("units", TypeDecl::Int).default(0))
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            number: args.take("number")?,
            items: args.records("items")?,
            units: args.take("units")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("number", &self.number)
            .with("items", FieldValue::records(&self.items))
            .with("units", self.units)
    }

    fn hooks() -> Hooks<Self> {
        Hooks::none()
            .with_pre_hydrate()
            .with_post_hydrate()
            .with_pre_serialize()
    }
}

impl PreHydrate for Order {
    /// Accept the legacy `order_no` key.
    fn pre_hydrate(mut raw: Map<String, Value>) -> Map<String, Value> {
        if let Some(number) = raw.remove("order_no") {
            raw.entry("number").or_insert(number);
        }
        raw
    }
}

impl PostHydrate for Order {
    fn post_hydrate(&mut self) {
        self.units = self.items.iter().map(|i| i.quantity).sum();
    }
}

impl PreSerialize for Order {
    fn pre_serialize(&mut self) {
        self.number = self.number.to_uppercase();
    }
}

// ---------------------------------------------------------------------------
// Contact: explicit source keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub email: String,
    pub city: Option<String>,
}

impl Record for Contact {
    fn declare() -> ClassDecl {
        ClassDecl::new("Contact")
            .field(FieldDecl::new("email", TypeDecl::String).map_from("user_email"))
            .field(
                FieldDecl::new("city", TypeDecl::optional(TypeDecl::String))
                    .map_from("profile.address.city")
                    .map_to("town"),
            )
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            email: args.take("email")?,
            city: args.take("city")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("email", &self.email)
            .with("city", self.city.clone())
    }
}

/// Renames `email` to `email_address`, leaves everything else alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailAddressNaming;

impl NamingStrategy for EmailAddressNaming {
    fn convert(&self, name: &str, _direction: Direction) -> String {
        if name == "email" {
            "email_address".to_string()
        } else {
            name.to_string()
        }
    }

    fn name(&self) -> &'static str {
        "email_address"
    }
}

// ---------------------------------------------------------------------------
// Plain: lossless scalars only, for round-trip properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Plain {
    pub label: String,
    pub count: i64,
    pub ratio: f64,
    pub enabled: bool,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub home: Address,
}

impl Record for Plain {
    fn declare() -> ClassDecl {
        ClassDecl::new("Plain")
            .field(FieldDecl::new("label", TypeDecl::String))
            .field(FieldDecl::new("count", TypeDecl::Int))
            .field(FieldDecl::new("ratio", TypeDecl::Float))
            .field(FieldDecl::new("enabled", TypeDecl::Bool))
            .field(FieldDecl::new("note", TypeDecl::optional(TypeDecl::String)))
            .field(FieldDecl::new("tags", TypeDecl::list(TypeDecl::String)))
            .field(FieldDecl::new("home", TypeDecl::record::<Address>()))
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            label: args.take("label")?,
            count: args.take("count")?,
            ratio: args.take("ratio")?,
            enabled: args.take("enabled")?,
            note: args.take("note")?,
            tags: args.take("tags")?,
            home: args.record_value("home")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("label", &self.label)
            .with("count", self.count)
            .with("ratio", self.ratio)
            .with("enabled", self.enabled)
            .with("note", self.note.clone())
            .with("tags", self.tags.clone())
            .with("home", FieldValue::record(&self.home))
    }
}

// ---------------------------------------------------------------------------
// Frozen: read-only record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Frozen {
    pub code: String,
}

impl Record for Frozen {
    fn declare() -> ClassDecl {
        ClassDecl::new("Frozen")
            .readonly()
            .field(FieldDecl::new("code", TypeDecl::String))
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            code: args.take("code")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new().with("code", &self.code)
    }
}

impl MutableRecord for Frozen {
    fn set_field(&mut self, name: &str, args: &mut Arguments) -> Result<()> {
        if name == "code" {
            self.code = args.take(name)?;
        }
        Ok(())
    }
}
