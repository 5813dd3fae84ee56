//! The compiler front end.
//!
//! Parsing, lexing and bytecode generation are explicitly out of scope for
//! this crate: no grammar, parser, or bytecode format is specified here.
//! What's kept is the *shape* the interpreter depends on: a grammar table
//! naming every statement form the language recognizes, and a `Compiler`
//! that holds one, so [`crate::context::Context`] has something concrete to
//! own and a future grammar/codegen layer has a seam to plug into without
//! touching the Cell/Proxy/Holder core.

/// One statement production. No parsing logic is attached — this is a
/// data-only enumeration of every form §4.5 lists a grammar table as
/// needing to recognize, including the modifier forms it calls out by name
/// (a `function` with an override marker, a `return` with or without a
/// value, a `struct` with or without `extends`) as their own productions
/// rather than flags, since no field of this enum is ever inspected by
/// parsing logic that would need them collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementForm {
    Expression,
    Import,
    Package,
    Using,
    VarDecl,
    ConstDecl,
    Block,
    Namespace,
    If,
    Switch,
    Case,
    Default,
    While,
    Until,
    Loop,
    For,
    ForDo,
    Foreach,
    ForeachDo,
    Break,
    Continue,
    FunctionDecl,
    FunctionOverrideDecl,
    Return,
    ReturnValue,
    StructDecl,
    StructExtendsDecl,
    TryCatch,
    Throw,
}

impl StatementForm {
    pub const ALL: &'static [StatementForm] = &[
        StatementForm::Expression,
        StatementForm::Import,
        StatementForm::Package,
        StatementForm::Using,
        StatementForm::VarDecl,
        StatementForm::ConstDecl,
        StatementForm::Block,
        StatementForm::Namespace,
        StatementForm::If,
        StatementForm::Switch,
        StatementForm::Case,
        StatementForm::Default,
        StatementForm::While,
        StatementForm::Until,
        StatementForm::Loop,
        StatementForm::For,
        StatementForm::ForDo,
        StatementForm::Foreach,
        StatementForm::ForeachDo,
        StatementForm::Break,
        StatementForm::Continue,
        StatementForm::FunctionDecl,
        StatementForm::FunctionOverrideDecl,
        StatementForm::Return,
        StatementForm::ReturnValue,
        StatementForm::StructDecl,
        StatementForm::StructExtendsDecl,
        StatementForm::TryCatch,
        StatementForm::Throw,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            StatementForm::Expression => "<expr>",
            StatementForm::Import => "import",
            StatementForm::Package => "package",
            StatementForm::Using => "using",
            StatementForm::VarDecl => "var",
            StatementForm::ConstDecl => "const",
            StatementForm::Block => "block",
            StatementForm::Namespace => "namespace",
            StatementForm::If => "if",
            StatementForm::Switch => "switch",
            StatementForm::Case => "case",
            StatementForm::Default => "default",
            StatementForm::While => "while",
            StatementForm::Until => "until",
            StatementForm::Loop => "loop",
            StatementForm::For => "for",
            StatementForm::ForDo => "for-do",
            StatementForm::Foreach => "foreach",
            StatementForm::ForeachDo => "foreach-do",
            StatementForm::Break => "break",
            StatementForm::Continue => "continue",
            StatementForm::FunctionDecl => "function",
            StatementForm::FunctionOverrideDecl => "function-override",
            StatementForm::Return => "return",
            StatementForm::ReturnValue => "return-value",
            StatementForm::StructDecl => "struct",
            StatementForm::StructExtendsDecl => "struct-extends",
            StatementForm::TryCatch => "try",
            StatementForm::Throw => "throw",
        }
    }
}

/// A table of recognized statement forms, keyed by keyword. Stands in for
/// the real grammar table a parser would consult.
#[derive(Debug, Clone)]
pub struct GrammarTable {
    forms: Vec<StatementForm>,
}

impl GrammarTable {
    /// The default table: every recognized statement form, nothing more.
    pub fn standard() -> Self {
        GrammarTable {
            forms: StatementForm::ALL.to_vec(),
        }
    }

    pub fn recognizes(&self, keyword: &str) -> bool {
        self.forms.iter().any(|f| f.keyword() == keyword)
    }

    pub fn forms(&self) -> &[StatementForm] {
        &self.forms
    }
}

impl Default for GrammarTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// The compiler component. Holds a grammar table; has no lexing, parsing,
/// or codegen methods because none are specified.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    grammar: GrammarTable,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            grammar: GrammarTable::standard(),
        }
    }

    pub fn grammar(&self) -> &GrammarTable {
        &self.grammar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_recognizes_every_form() {
        let g = GrammarTable::standard();
        for form in StatementForm::ALL {
            assert!(g.recognizes(form.keyword()));
        }
    }

    #[test]
    fn unknown_keyword_is_not_recognized() {
        let g = GrammarTable::standard();
        assert!(!g.recognizes("goto"));
    }

    #[test]
    fn fresh_compiler_uses_the_standard_grammar() {
        let c = Compiler::new();
        assert_eq!(c.grammar().forms().len(), StatementForm::ALL.len());
    }
}
