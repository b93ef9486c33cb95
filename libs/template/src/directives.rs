//! Directive attribute vocabulary
//!
//! Directive attributes live in the processor namespace (`m:if`, `th:text`, ...). The table
//! below fixes the order in which the directives on one element run; attributes that are not
//! in the table are generic substitutions into the plain attribute of the same local name.

use phf::{phf_map, phf_set};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Insert,
    Replace,
    Include,
    Each,
    If,
    Unless,
    Switch,
    Case,
    Object,
    With,
    Attr,
    AttrAppend,
    AttrPrepend,
    ClassAppend,
    StyleAppend,
    Text,
    UText,
    Fragment,
    Ref,
    Remove,
    Inline,
    Assert,
    Block,
}

static DIRECTIVES: phf::Map<&'static str, Directive> = phf_map! {
    "insert" => Directive::Insert,
    "replace" => Directive::Replace,
    "include" => Directive::Include,
    "each" => Directive::Each,
    "if" => Directive::If,
    "unless" => Directive::Unless,
    "switch" => Directive::Switch,
    "case" => Directive::Case,
    "object" => Directive::Object,
    "with" => Directive::With,
    "attr" => Directive::Attr,
    "attrappend" => Directive::AttrAppend,
    "attrprepend" => Directive::AttrPrepend,
    "classappend" => Directive::ClassAppend,
    "styleappend" => Directive::StyleAppend,
    "text" => Directive::Text,
    "utext" => Directive::UText,
    "fragment" => Directive::Fragment,
    "ref" => Directive::Ref,
    "remove" => Directive::Remove,
    "inline" => Directive::Inline,
    "assert" => Directive::Assert,
    "block" => Directive::Block,
};

/// HTML attributes whose only valid value is their own name
static BOOLEAN_ATTRIBUTES: phf::Set<&'static str> = phf_set! {
    "async", "autofocus", "autoplay", "checked", "controls", "declare", "default", "defer",
    "disabled", "formnovalidate", "hidden", "ismap", "loop", "multiple", "novalidate",
    "nowrap", "open", "pubdate", "readonly", "required", "reversed", "scoped", "seamless",
    "selected",
};

impl Directive {
    pub fn from_name(local_name: &str) -> Option<Directive> {
        DIRECTIVES.get(local_name).copied()
    }

    /// Lower runs first
    pub fn precedence(self) -> i32 {
        match self {
            Directive::Insert | Directive::Replace => -10,
            Directive::Each => -9,
            Directive::If | Directive::Unless | Directive::Switch | Directive::Case => -8,
            Directive::Object | Directive::With => -7,
            Directive::Attr
            | Directive::AttrAppend
            | Directive::AttrPrepend
            | Directive::ClassAppend
            | Directive::StyleAppend => -6,
            Directive::Text | Directive::UText => 1,
            Directive::Fragment => 2,
            Directive::Remove => 3,
            Directive::Include
            | Directive::Ref
            | Directive::Inline
            | Directive::Assert
            | Directive::Block => 0,
        }
    }

    /// Markers handled by post-processing rather than the tree walk
    pub fn is_post_processed(self) -> bool {
        matches!(self, Directive::Remove | Directive::Ref | Directive::Fragment)
    }
}

/// Sort key for a directive attribute's local name; unknown names are generic (0)
pub fn attribute_precedence(local_name: &str) -> i32 {
    Directive::from_name(local_name).map_or(0, Directive::precedence)
}

pub fn is_boolean_attribute(local_name: &str) -> bool {
    BOOLEAN_ATTRIBUTES.contains(local_name)
}

/// What the tree walk does with the element after a directive ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeAction {
    None,
    /// Detach the element and stop processing it
    Remove,
}
