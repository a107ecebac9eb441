//! HTTP transport for the action API
pub mod blocking;
