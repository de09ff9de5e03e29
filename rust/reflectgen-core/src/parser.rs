use crate::analyzer::metadata::{ComponentReflectionInfo, VariableReflectionInfo};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};
use std::path::Path;

/// Qualifiers that keep a separating space when a field type is rebuilt.
const TYPE_QUALIFIERS: &[&str] = &["const", "mutable", "volatile"];

/// Leading words of member declarations that never name a data member.
const NON_FIELD_INTRODUCERS: &[&str] = &["using", "typedef", "friend", "enum"];

static END_OF_INPUT: Token = Token {
    line: 0,
    column: 0,
    kind: TokenKind::EndOfFile,
    text: String::new(),
};

struct NamespaceEntry {
    depth: usize,
    name: String,
}

/// Scan `tokens` for annotated records and append them to `components`,
/// stamping each with `filepath`. Stops at the first structural error.
pub fn parse(
    tokens: &[Token],
    filepath: &Path,
    components: &mut Vec<ComponentReflectionInfo>,
) -> Result<(), ParseError> {
    Parser::new(tokens, filepath).run(components)
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    filepath: &'a Path,
    namespaces: Vec<NamespaceEntry>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], filepath: &'a Path) -> Self {
        Self {
            tokens,
            pos: 0,
            filepath,
            namespaces: Vec::new(),
        }
    }

    pub fn run(mut self, components: &mut Vec<ComponentReflectionInfo>) -> Result<(), ParseError> {
        let mut level = 0usize;
        while !self.finished() {
            if self.matches(TokenKind::ComponentMarker) {
                self.expect(TokenKind::LeftParen)?;
                self.skip_marker_arguments()?;
                self.matches(TokenKind::Semicolon);

                let mut component = self.parse_definition()?;
                component.filepath = self.filepath.to_path_buf();
                components.push(component);
            } else if self.matches(TokenKind::NamespaceKw) {
                self.parse_namespace(level)?;
            } else if self.matches(TokenKind::LeftBrace) {
                level += 1;
            } else if self.matches(TokenKind::RightBrace) {
                level = level.saturating_sub(1);
                if self.namespaces.last().is_some_and(|ns| ns.depth == level) {
                    self.namespaces.pop();
                }
            } else {
                self.advance();
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Cursor
// ----------------------------------------------------------------------------

impl<'a> Parser<'a> {
    fn current(&self) -> &'a Token {
        self.tokens.get(self.pos).unwrap_or(&END_OF_INPUT)
    }

    fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::EndOfFile, |t| t.kind)
    }

    fn finished(&self) -> bool {
        self.current().is(TokenKind::EndOfFile)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token, ParseError> {
        let token = self.current();
        if token.is(kind) {
            self.advance();
            Ok(token)
        } else {
            Err(self.unexpected(kind))
        }
    }

    fn unexpected(&self, expected: TokenKind) -> ParseError {
        self.error(format!(
            "Expected {} but instead got {}",
            expected,
            self.current().kind
        ))
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let token = self.current();
        ParseError {
            message: message.into(),
            file: self.filepath.to_path_buf(),
            line: token.line,
            column: token.column,
        }
    }

    fn namespace_prefix(&self) -> String {
        self.namespaces
            .iter()
            .map(|ns| format!("{}::", ns.name))
            .collect()
    }
}

// ----------------------------------------------------------------------------
// Skipping
// ----------------------------------------------------------------------------

impl<'a> Parser<'a> {
    /// Marker arguments are not interpreted; skip to the matching `)`.
    fn skip_marker_arguments(&mut self) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while !self.finished() {
            match self.current().kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.advance();
        }
        Err(self.unexpected(TokenKind::RightParen))
    }

    /// Consume a balanced `{ ... }` starting at the current `{`.
    fn skip_block(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::LeftBrace)?;
        let mut depth = 1usize;
        while !self.finished() {
            match self.current().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.advance();
        }
        Err(self.unexpected(TokenKind::RightBrace))
    }

    /// Nested `struct`/`class` inside a record body. Its contents are dropped.
    /// A `;` before any `{` means a declaration such as `struct Foo* ptr;`.
    fn skip_nested_record(&mut self) -> Result<(), ParseError> {
        self.advance();
        while !self.finished() && !self.check(TokenKind::LeftBrace) {
            if self.matches(TokenKind::Semicolon) {
                return Ok(());
            }
            self.advance();
        }
        self.skip_block()?;
        self.matches(TokenKind::Semicolon);
        Ok(())
    }

    /// Advance past the end of a member declaration, including a method body
    /// or brace initializer and the `;` after it.
    fn skip_declaration_rest(&mut self) -> Result<(), ParseError> {
        while !self.finished() {
            if self.matches(TokenKind::Semicolon) || self.check(TokenKind::RightBrace) {
                return Ok(());
            }
            if self.check(TokenKind::LeftBrace) {
                self.skip_block()?;
                self.matches(TokenKind::Semicolon);
                return Ok(());
            }
            self.advance();
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Grammar
// ----------------------------------------------------------------------------

impl<'a> Parser<'a> {
    fn parse_namespace(&mut self, level: usize) -> Result<(), ParseError> {
        // Anonymous namespace: its brace is counted by the main loop and it
        // contributes no name segment.
        if self.check(TokenKind::LeftBrace) {
            return Ok(());
        }
        if !self.check(TokenKind::Identifier) {
            return Err(self.error("Expected a identifier after 'namespace'"));
        }

        let mut segments = Vec::new();
        loop {
            segments.push(self.expect(TokenKind::Identifier)?.text.as_str());
            if self.check(TokenKind::Colon) && self.peek_kind(1) == TokenKind::Colon {
                self.advance();
                self.advance();
            } else {
                break;
            }
        }

        // `using namespace X;` and `namespace X = Y;` open no scope.
        if self.check(TokenKind::LeftBrace) {
            self.namespaces.push(NamespaceEntry {
                depth: level,
                name: segments.join("::"),
            });
        }
        Ok(())
    }

    /// `struct`/`class` header up to and including the opening brace. Returns
    /// the qualified name and the default member visibility.
    fn parse_record_header(&mut self) -> Result<(String, bool), ParseError> {
        let is_public = if self.matches(TokenKind::ClassKw) {
            false
        } else {
            self.expect(TokenKind::StructKw)?;
            true
        };

        // Only the last identifier names the record: `class ENGINE_API Foo`.
        let mut name: Option<&'a Token> = None;
        while !self.finished()
            && !self.check(TokenKind::Colon)
            && !self.check(TokenKind::LeftBrace)
            && !self.check(TokenKind::Semicolon)
        {
            let token = self.current();
            if token.is(TokenKind::Identifier) && token.text != "final" {
                name = Some(token);
            }
            self.advance();
        }
        let Some(name) = name else {
            return Err(self.unexpected(TokenKind::Identifier));
        };

        if self.matches(TokenKind::Colon) {
            while !self.finished() && !self.check(TokenKind::LeftBrace) {
                self.advance();
            }
        }
        self.expect(TokenKind::LeftBrace)?;

        Ok((format!("{}{}", self.namespace_prefix(), name.text), is_public))
    }

    fn parse_definition(&mut self) -> Result<ComponentReflectionInfo, ParseError> {
        let (fullname, mut is_public) = self.parse_record_header()?;
        let mut component = ComponentReflectionInfo {
            fullname,
            ..Default::default()
        };

        let mut component_level = 1usize;
        while !self.finished() {
            match self.current().kind {
                TokenKind::LeftBrace => {
                    component_level += 1;
                    self.advance();
                }
                TokenKind::RightBrace => {
                    self.advance();
                    component_level -= 1;
                    if component_level == 0 {
                        self.matches(TokenKind::Semicolon);
                        return Ok(component);
                    }
                }
                TokenKind::PublicKw => {
                    is_public = true;
                    self.advance();
                    self.matches(TokenKind::Colon);
                }
                TokenKind::ProtectedKw | TokenKind::PrivateKw => {
                    is_public = false;
                    self.advance();
                    self.matches(TokenKind::Colon);
                }
                TokenKind::StructKw | TokenKind::ClassKw => self.skip_nested_record()?,
                TokenKind::Identifier if is_public => {
                    if let Some(variable) = self.parse_field()? {
                        component.variables.push(variable);
                    }
                }
                _ => self.advance(),
            }
        }
        Err(self.unexpected(TokenKind::RightBrace))
    }

    /// One public member declaration. Yields a field only for data members.
    fn parse_field(&mut self) -> Result<Option<VariableReflectionInfo>, ParseError> {
        let mut parts: Vec<&'a Token> = Vec::new();
        while !self.finished() && is_inside_declarator(self.current()) {
            let token = self.current();
            if token.text == "static" || token.text == "constexpr" {
                break;
            }
            self.advance();
            if token.text != "inline" {
                parts.push(token);
            }
        }

        let field = if self.check(TokenKind::LeftParen) {
            None
        } else {
            field_from_parts(&parts)
        };
        self.skip_declaration_rest()?;
        Ok(field)
    }
}

fn is_inside_declarator(token: &Token) -> bool {
    !matches!(
        token.kind,
        TokenKind::Semicolon
            | TokenKind::Equals
            | TokenKind::LeftBrace
            | TokenKind::LeftParen
            | TokenKind::RightBrace
    )
}

fn field_from_parts(parts: &[&Token]) -> Option<VariableReflectionInfo> {
    let (last, type_parts) = parts.split_last()?;
    if !last.is(TokenKind::Identifier) {
        return None;
    }
    if parts
        .first()
        .is_some_and(|t| NON_FIELD_INTRODUCERS.contains(&t.text.as_str()))
        || parts.iter().any(|t| t.text == "operator")
    {
        return None;
    }

    let mut type_name = String::new();
    for token in type_parts {
        type_name.push_str(&token.text);
        if TYPE_QUALIFIERS.contains(&token.text.as_str()) {
            type_name.push(' ');
        }
    }
    Some(VariableReflectionInfo::new(type_name, last.text.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use std::path::PathBuf;

    fn parse_source(source: &str) -> Result<Vec<ComponentReflectionInfo>, ParseError> {
        let tokenized = tokenize(source);
        assert!(tokenized.is_successful(), "{:?}", tokenized.errors);
        let mut components = Vec::new();
        parse(&tokenized.tokens, Path::new("src/test.hpp"), &mut components)?;
        Ok(components)
    }

    fn fields(component: &ComponentReflectionInfo) -> Vec<(&str, &str)> {
        component
            .variables
            .iter()
            .map(|v| (v.type_name.as_str(), v.name.as_str()))
            .collect()
    }

    #[test]
    fn nested_namespaces_qualify_the_name() {
        let components =
            parse_source("namespace A { namespace B { Component(); struct S { int x; }; } }").unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].fullname, "A::B::S");
        assert_eq!(fields(&components[0]), vec![("int", "x")]);
        assert_eq!(components[0].filepath, PathBuf::from("src/test.hpp"));
    }

    #[test]
    fn qualified_namespace_declaration() {
        let components = parse_source("namespace A::B { Component() struct S { float f; }; }").unwrap();
        assert_eq!(components[0].fullname, "A::B::S");
    }

    #[test]
    fn namespace_scope_ends_with_its_brace() {
        let src = "namespace A { Component() struct S {}; } Component() struct T {};";
        let components = parse_source(src).unwrap();
        let names: Vec<&str> = components.iter().map(|c| c.fullname.as_str()).collect();
        assert_eq!(names, vec!["A::S", "T"]);
    }

    #[test]
    fn anonymous_namespace_adds_no_segment() {
        // Components inside `namespace { }` keep only the enclosing qualification.
        let src = "namespace A { namespace { Component(); struct S { int x; }; } }";
        let components = parse_source(src).unwrap();
        assert_eq!(components[0].fullname, "A::S");
    }

    #[test]
    fn using_directive_does_not_open_a_scope() {
        let src = "using namespace std; Component(); struct S { int x; };";
        assert_eq!(parse_source(src).unwrap()[0].fullname, "S");
    }

    #[test]
    fn only_public_fields_are_reflected() {
        let src = "Component(); struct S { public: int a; private: int b; protected: int c; public: int d; };";
        let components = parse_source(src).unwrap();
        assert_eq!(fields(&components[0]), vec![("int", "a"), ("int", "d")]);
    }

    #[test]
    fn class_members_default_to_private() {
        let src = "Component() class ENGINE_API Foo : public Base, private Other { int hidden; public: double shown; };";
        let components = parse_source(src).unwrap();
        assert_eq!(components[0].fullname, "Foo");
        assert_eq!(fields(&components[0]), vec![("double", "shown")]);
    }

    #[test]
    fn methods_and_static_members_are_excluded() {
        let src = "Component(); struct S { int a; void f() {} static int b; };";
        let components = parse_source(src).unwrap();
        assert_eq!(fields(&components[0]), vec![("int", "a")]);

        let src = "Component() struct S { inline static int s = 1; static constexpr float k = 2.f; \
                   constexpr int c = 3; int g() const; S() : a{1} {} int a; virtual ~S() = default; };";
        let components = parse_source(src).unwrap();
        assert_eq!(fields(&components[0]), vec![("int", "a")]);
    }

    #[test]
    fn nested_types_are_skipped() {
        let src = "Component(); struct S { struct Inner { int z; }; int a; };";
        let components = parse_source(src).unwrap();
        assert_eq!(fields(&components[0]), vec![("int", "a")]);

        let src = "Component() struct S { class Inner { void f() { if (x) { y(); } } int z; }; int a; };";
        let components = parse_source(src).unwrap();
        assert_eq!(fields(&components[0]), vec![("int", "a")]);
    }

    #[test]
    fn named_instance_of_nested_type_has_empty_type() {
        let src = "namespace ANamespace { Component(); struct NestedComponent { \
                   struct NestedStruct { int integer = 0; } Nested; }; }";
        let components = parse_source(src).unwrap();
        assert_eq!(components[0].fullname, "ANamespace::NestedComponent");
        assert_eq!(fields(&components[0]), vec![("", "Nested")]);
    }

    #[test]
    fn field_types_keep_qualifier_spacing() {
        let src = "Component() struct S { const char* name; mutable int m; std::vector<int> v; \
                   volatile unsigned long long& r; inline float i; };";
        let components = parse_source(src).unwrap();
        assert_eq!(
            fields(&components[0]),
            vec![
                ("const char*", "name"),
                ("mutable int", "m"),
                ("std::vector<int>", "v"),
                ("volatile unsignedlonglong&", "r"),
                ("float", "i"),
            ]
        );
    }

    #[test]
    fn initializers_are_skipped() {
        let src = "Component() struct S { int a = 5; float b{1.0f}; Vec3 c = { 1, 2, 3 }; bool d = true; int e; };";
        let components = parse_source(src).unwrap();
        let names: Vec<&str> = components[0].variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn non_field_declarations_are_ignored() {
        let src = "Component() struct S { using Alias = int; typedef int T; friend class X; \
                   enum class E { A, B }; bool operator==(const S&) const; int a; };";
        let components = parse_source(src).unwrap();
        assert_eq!(fields(&components[0]), vec![("int", "a")]);
    }

    #[test]
    fn marker_arguments_are_skipped() {
        let src = "Component(Order(1), \"x\") struct S { int a; };";
        let components = parse_source(src).unwrap();
        assert_eq!(fields(&components[0]), vec![("int", "a")]);
    }

    #[test]
    fn unclosed_marker_arguments_are_an_error() {
        let err = parse_source("Component(Order(1) struct S {};").unwrap_err();
        assert_eq!(err.message, "Expected RIGHT_PAREN but instead got END_OF_FILE");
    }

    #[test]
    fn final_is_not_taken_as_the_record_name() {
        let components = parse_source("Component() struct S final { int a; };").unwrap();
        assert_eq!(components[0].fullname, "S");
        assert_eq!(fields(&components[0]), vec![("int", "a")]);
    }

    #[test]
    fn unmarked_records_are_ignored() {
        let src = "struct Plain { int a; }; Component() struct Marked { int b; }; class Other { public: int c; };";
        let components = parse_source(src).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].fullname, "Marked");
    }

    #[test]
    fn accumulates_across_files() {
        let mut components = Vec::new();
        let first = tokenize("Component() struct A { int x; };");
        let second = tokenize("Component() struct B { int y; };");
        parse(&first.tokens, Path::new("a.hpp"), &mut components).unwrap();
        parse(&second.tokens, Path::new("b.hpp"), &mut components).unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].filepath, PathBuf::from("a.hpp"));
        assert_eq!(components[1].filepath, PathBuf::from("b.hpp"));
    }

    #[test]
    fn missing_paren_is_reported_with_position() {
        let err = parse_source("Component struct S {};").unwrap_err();
        assert_eq!(err.message, "Expected LEFT_PAREN but instead got STRUCT_KW");
        assert_eq!((err.line, err.column), (1, 11));
        assert_eq!(
            err.to_string(),
            "Expected LEFT_PAREN but instead got STRUCT_KW at src/test.hpp in line 1:11"
        );
    }

    #[test]
    fn namespace_without_identifier_is_an_error() {
        let err = parse_source("namespace ;").unwrap_err();
        assert_eq!(err.message, "Expected a identifier after 'namespace'");
    }

    #[test]
    fn marker_before_non_record_is_an_error() {
        let err = parse_source("Component() int x;").unwrap_err();
        assert_eq!(err.message, "Expected STRUCT_KW but instead got IDENTIFIER");
    }

    #[test]
    fn unterminated_record_is_an_error() {
        let err = parse_source("Component() struct S { int a;").unwrap_err();
        assert_eq!(err.message, "Expected RIGHT_BRACE but instead got END_OF_FILE");
    }

    #[test]
    fn unbalanced_closing_brace_does_not_underflow() {
        let components = parse_source("} } Component() struct S { int a; };").unwrap();
        assert_eq!(components[0].fullname, "S");
    }
}
