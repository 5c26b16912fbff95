//! Customer types

use uuid::Uuid;

/// Customer row ready for insertion
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub id: Uuid,
    /// Human-facing customer number carried in the spreadsheets
    pub sequence_number: i64,
    pub full_name: String,
    pub mobile_number: String,
    pub mobile_number2: Option<String>,
    pub civil_id: Option<String>,
}

impl NewCustomer {
    pub fn new(
        sequence_number: i64,
        full_name: String,
        mobile_number: String,
        mobile_number2: Option<String>,
        civil_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence_number,
            full_name,
            mobile_number,
            mobile_number2,
            civil_id,
        }
    }
}
