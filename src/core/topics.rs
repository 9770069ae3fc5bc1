//! # Topic Catalog
//!
//! Canned prompts shown in the sidebar, plus the system instruction the chat
//! session is seeded with. Both are compile-time constants: changing what the
//! assistant specializes in means editing this file.

/// A sidebar shortcut. Selecting it sends `prompt` as if the user typed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub id: &'static str,
    pub title: &'static str,
    pub prompt: &'static str,
    /// Symbolic icon tag, resolved by [`icon_glyph`].
    pub icon: &'static str,
}

/// An external reference listed under the topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub title: &'static str,
    pub url: &'static str,
}

pub const SYSTEM_INSTRUCTION: &str = "\
You are a World-Class Laravel Architect specializing in Multi-Tenancy SaaS platforms.
Your goal is to assist developers in building robust, scalable multi-tenant applications using Laravel.

Key Guidelines:
1. **Packages**: Familiarity with 'stancl/tenancy', 'spatie/laravel-multitenancy', and native Scopes.
2. **Architecture**: Always explain the trade-offs between Multi-Database (strict isolation) and Single-Database (shared tables with tenant_id).
3. **Code Style**: Provide clean, modern PHP 8.2+ code. Use strict types, constructor promotion, and match expressions where applicable.
4. **Context**: Assume the user is building a SaaS. Mention middleware, DNS configuration, and job queues when relevant.
5. **Tone**: Professional, technical, and encouraging.

When generating code, use Markdown code blocks with 'php' syntax highlighting.
";

pub const TOPICS: &[Topic] = &[
    Topic {
        id: "setup-basics",
        title: "Tenancy Setup",
        prompt: "How do I set up a fresh Laravel project with the stancl/tenancy package for multi-database architecture?",
        icon: "Box",
    },
    Topic {
        id: "db-strategy",
        title: "Database Strategy",
        prompt: "Compare Single-Database vs Multi-Database tenacity strategies in Laravel. Which one should I use for a high-volume SaaS?",
        icon: "Database",
    },
    Topic {
        id: "auth-guard",
        title: "Auth & Guards",
        prompt: "How do I configure Authentication guards to separate \"Tenant Users\" from \"Central Admin Users\" in Laravel?",
        icon: "Shield",
    },
    Topic {
        id: "domain-routing",
        title: "Domain Routing",
        prompt: "Explain how to handle Subdomains (foo.app.com) vs Custom Domains (foo.com) using Laravel middleware.",
        icon: "Globe",
    },
];

pub const RESOURCES: &[Resource] = &[
    Resource {
        title: "Tenancy for Laravel",
        url: "https://tenancyforlaravel.com/",
    },
    Resource {
        title: "Spatie Multitenancy",
        url: "https://spatie.be/docs/laravel-multitenancy",
    },
];

pub const PRO_TIP: &str =
    "Ask about \"Bootstrappers\" to learn how to isolate cache and sessions per tenant.";

/// Glyph used when an icon tag is not recognized.
pub const DEFAULT_GLYPH: &str = "▸";

/// Resolves an icon tag to the glyph drawn next to the topic title.
pub fn icon_glyph(tag: &str) -> &'static str {
    match tag {
        "Box" => "▣",
        "Database" => "◍",
        "Shield" => "◈",
        "Globe" => "◎",
        _ => DEFAULT_GLYPH,
    }
}

pub fn find(id: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|t| t.id == id)
}
