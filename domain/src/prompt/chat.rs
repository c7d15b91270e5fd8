//! System prompt assembly for chat runs

use crate::agent::config::{AgentConfig, Verbosity};
use crate::core::ids::TenantId;

const DEFAULT_BASE_PROMPT: &str = "You are a helpful assistant for a retail business. \
You help staff manage inventory, orders and customers using the tools available to you.";

/// Templates for the chat system prompt
pub struct ChatPromptTemplate;

impl ChatPromptTemplate {
    /// Base prompt, then tenant binding, capability restrictions and style
    /// hints, in that order.
    pub fn system(config: &AgentConfig, tenant: &TenantId) -> String {
        let base = config.system_prompt.trim();
        let base = if base.is_empty() {
            DEFAULT_BASE_PROMPT
        } else {
            base
        };

        let mut sections = vec![base.to_string(), Self::tenant_section(tenant)];
        if let Some(restrictions) = Self::capability_section(config) {
            sections.push(restrictions);
        }
        if let Some(style) = Self::style_section(config) {
            sections.push(style);
        }
        sections.join("\n\n")
    }

    fn tenant_section(tenant: &TenantId) -> String {
        format!(
            "## Store\n\nYou are working for store `{}`. Every tool call is automatically \
scoped to this store. Never ask for, or pass, a store id yourself.",
            tenant
        )
    }

    fn capability_section(config: &AgentConfig) -> Option<String> {
        let caps = &config.capabilities;
        if caps.is_unrestricted() {
            return None;
        }
        let mut rules = Vec::new();
        if !caps.can_read {
            rules.push("- Do not read business records.");
        }
        if !caps.can_write {
            rules.push("- Do not create, modify or delete anything. You have read-only access.");
        }
        if !caps.can_query {
            rules.push("- Do not run searches or reports.");
        }
        Some(format!("## Restrictions\n\n{}", rules.join("\n")))
    }

    fn style_section(config: &AgentConfig) -> Option<String> {
        let verbosity = match config.verbosity {
            Verbosity::Concise => Some("Keep answers short and to the point."),
            Verbosity::Normal => None,
            Verbosity::Detailed => Some("Give thorough answers and explain your reasoning."),
        };
        let tone = config
            .tone
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        if verbosity.is_none() && tone.is_none() {
            return None;
        }
        let mut lines = Vec::new();
        if let Some(tone) = tone {
            lines.push(format!("Use a {} tone.", tone));
        }
        if let Some(verbosity) = verbosity {
            lines.push(verbosity.to_string());
        }
        Some(format!("## Style\n\n{}", lines.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::config::Capabilities;

    #[test]
    fn test_default_prompt_contains_tenant_binding() {
        let prompt = ChatPromptTemplate::system(&AgentConfig::default(), &TenantId::new("s-42"));
        assert!(prompt.starts_with(DEFAULT_BASE_PROMPT));
        assert!(prompt.contains("`s-42`"));
        assert!(!prompt.contains("## Restrictions"));
        assert!(!prompt.contains("## Style"));
    }

    #[test]
    fn test_custom_base_and_restrictions() {
        let config = AgentConfig::default()
            .with_system_prompt("You are Stocky.")
            .with_capabilities(Capabilities::read_only());
        let prompt = ChatPromptTemplate::system(&config, &TenantId::new("s"));
        assert!(prompt.starts_with("You are Stocky."));
        assert!(prompt.contains("read-only"));
        assert!(!prompt.contains("Do not run searches"));
    }

    #[test]
    fn test_style_section() {
        let mut config = AgentConfig::default();
        config.tone = Some("friendly".to_string());
        config.verbosity = Verbosity::Concise;
        let prompt = ChatPromptTemplate::system(&config, &TenantId::new("s"));
        assert!(prompt.ends_with(
            "## Style\n\nUse a friendly tone. Keep answers short and to the point."
        ));
    }
}
