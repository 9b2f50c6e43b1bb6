//! The four compact-context providers.
//!
//! Each one gathers records from the host, projects them onto a few short
//! fields and renders them as a tab-delimited table under a `# Section`
//! heading. Plain renderings are kept in `values` for templates that
//! expect them.

pub mod actions;
pub mod conversation;
pub mod entities;
pub mod facts;

#[cfg(test)]
pub(crate) mod test_support;

pub use actions::ActionsProvider;
pub use conversation::ConversationProvider;
pub use entities::EntitiesProvider;
pub use facts::FactsProvider;

use serde::Serialize;
use serde_json::Value;
use toonctx_codec::encode_or_fallback;

use crate::formatter::add_header;
use crate::runtime::HostRuntime;

/// Encode `rows` as a context table under `header`; no rows, no section.
pub(crate) fn table_section(runtime: &HostRuntime, header: &str, rows: Vec<Value>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let encoded = encode_or_fallback(&Value::Array(rows), &runtime.context_options());
    add_header(header, &encoded.text)
}

/// Records exposed through `ProviderResult::data`.
pub(crate) fn to_data<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Join the non-empty sections with blank lines.
pub(crate) fn join_sections<'a>(sections: impl IntoIterator<Item = &'a str>) -> String {
    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
