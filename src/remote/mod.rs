pub mod auth;
pub mod store;
pub mod supabase;
