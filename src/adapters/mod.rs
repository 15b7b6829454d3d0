// Adapters layer: concrete implementations for external systems (store client, http boundary, local output).

pub mod http;
pub mod local;
pub mod supabase;
