// ABOUTME: Shared utility functions for the IVM workspace
// ABOUTME: Provides unique id generation for deployed ICodes

/// Generate a fresh globally-unique ICode identity
pub fn generate_icode_id() -> String {
    format!("icode_{}", uuid::Uuid::new_v4().to_string().replace('-', ""))
}
