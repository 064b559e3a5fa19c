//! ESTree syntax tree.
//!
//! Every node serializes to its ESTree shape: a `type` tag, `start`/`end` byte
//! offsets, an optional `loc` record and the node's ESTree fields in camelCase.

use serde::{Deserialize, Serialize, Serializer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 1-based line.
    pub line: u32,
    /// 0-based column, counted in Unicode scalar values.
    pub column: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

impl Span {
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Program", rename_all = "camelCase")]
pub struct Program {
    #[serde(flatten)]
    pub span: Span,
    pub body: Vec<Statement>,
    pub source_type: SourceType,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum Statement {
    Expression(ExpressionStatement),
    Block(BlockStatement),
    Empty(EmptyStatement),
    Debugger(DebuggerStatement),
    With(Box<WithStatement>),
    Return(ReturnStatement),
    Labeled(Box<LabeledStatement>),
    Break(BreakStatement),
    Continue(ContinueStatement),
    If(Box<IfStatement>),
    Switch(SwitchStatement),
    Throw(ThrowStatement),
    Try(Box<TryStatement>),
    While(Box<WhileStatement>),
    DoWhile(Box<DoWhileStatement>),
    For(Box<ForStatement>),
    ForIn(Box<ForInStatement>),
    ForOf(Box<ForOfStatement>),
    Function(Box<Function>),
    Variable(VariableDeclaration),
    Class(Box<Class>),
    Import(ImportDeclaration),
    ExportNamed(Box<ExportNamedDeclaration>),
    ExportDefault(Box<ExportDefaultDeclaration>),
    ExportAll(ExportAllDeclaration),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExpressionStatement")]
pub struct ExpressionStatement {
    #[serde(flatten)]
    pub span: Span,
    pub expression: Expression,
    /// Raw text of a directive prologue entry, without quotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "BlockStatement")]
pub struct BlockStatement {
    #[serde(flatten)]
    pub span: Span,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "EmptyStatement")]
pub struct EmptyStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "DebuggerStatement")]
pub struct DebuggerStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "WithStatement")]
pub struct WithStatement {
    #[serde(flatten)]
    pub span: Span,
    pub object: Expression,
    pub body: Statement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ReturnStatement")]
pub struct ReturnStatement {
    #[serde(flatten)]
    pub span: Span,
    pub argument: Option<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "LabeledStatement")]
pub struct LabeledStatement {
    #[serde(flatten)]
    pub span: Span,
    pub label: Identifier,
    pub body: Statement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "BreakStatement")]
pub struct BreakStatement {
    #[serde(flatten)]
    pub span: Span,
    pub label: Option<Identifier>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ContinueStatement")]
pub struct ContinueStatement {
    #[serde(flatten)]
    pub span: Span,
    pub label: Option<Identifier>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "IfStatement")]
pub struct IfStatement {
    #[serde(flatten)]
    pub span: Span,
    pub test: Expression,
    pub consequent: Statement,
    pub alternate: Option<Statement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SwitchStatement")]
pub struct SwitchStatement {
    #[serde(flatten)]
    pub span: Span,
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SwitchCase")]
pub struct SwitchCase {
    #[serde(flatten)]
    pub span: Span,
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ThrowStatement")]
pub struct ThrowStatement {
    #[serde(flatten)]
    pub span: Span,
    pub argument: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TryStatement")]
pub struct TryStatement {
    #[serde(flatten)]
    pub span: Span,
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "CatchClause")]
pub struct CatchClause {
    #[serde(flatten)]
    pub span: Span,
    pub param: Option<Pattern>,
    pub body: BlockStatement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "WhileStatement")]
pub struct WhileStatement {
    #[serde(flatten)]
    pub span: Span,
    pub test: Expression,
    pub body: Statement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "DoWhileStatement")]
pub struct DoWhileStatement {
    #[serde(flatten)]
    pub span: Span,
    pub body: Statement,
    pub test: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForLeft {
    Variable(VariableDeclaration),
    Pattern(Pattern),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ForStatement")]
pub struct ForStatement {
    #[serde(flatten)]
    pub span: Span,
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Statement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ForInStatement")]
pub struct ForInStatement {
    #[serde(flatten)]
    pub span: Span,
    pub left: ForLeft,
    pub right: Expression,
    pub body: Statement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ForOfStatement")]
pub struct ForOfStatement {
    #[serde(flatten)]
    pub span: Span,
    #[serde(rename = "await")]
    pub is_await: bool,
    pub left: ForLeft,
    pub right: Expression,
    pub body: Statement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "VariableDeclaration")]
pub struct VariableDeclaration {
    #[serde(flatten)]
    pub span: Span,
    pub declarations: Vec<VariableDeclarator>,
    pub kind: VarKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "VariableDeclarator")]
pub struct VariableDeclarator {
    #[serde(flatten)]
    pub span: Span,
    pub id: Pattern,
    pub init: Option<Expression>,
}

// ---------------------------------------------------------------------------
// Functions and classes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FunctionType {
    FunctionDeclaration,
    FunctionExpression,
}

/// Shared by function declarations, function expressions and method values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Function {
    #[serde(rename = "type")]
    pub ty: FunctionType,
    #[serde(flatten)]
    pub span: Span,
    pub id: Option<Identifier>,
    pub params: Vec<Pattern>,
    pub body: BlockStatement,
    pub generator: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrowBody {
    Block(BlockStatement),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ArrowFunctionExpression")]
pub struct ArrowFunctionExpression {
    #[serde(flatten)]
    pub span: Span,
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
    pub expression: bool,
    pub generator: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ClassType {
    ClassDeclaration,
    ClassExpression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    #[serde(rename = "type")]
    pub ty: ClassType,
    #[serde(flatten)]
    pub span: Span,
    pub id: Option<Identifier>,
    pub super_class: Option<Expression>,
    pub body: ClassBody,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ClassBody")]
pub struct ClassBody {
    #[serde(flatten)]
    pub span: Span,
    pub body: Vec<ClassElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassElement {
    Method(MethodDefinition),
    Property(PropertyDefinition),
    StaticBlock(StaticBlock),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "MethodDefinition")]
pub struct MethodDefinition {
    #[serde(flatten)]
    pub span: Span,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub computed: bool,
    pub key: Expression,
    pub kind: MethodKind,
    pub value: Box<Function>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "PropertyDefinition")]
pub struct PropertyDefinition {
    #[serde(flatten)]
    pub span: Span,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub computed: bool,
    pub key: Expression,
    pub value: Option<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "StaticBlock")]
pub struct StaticBlock {
    #[serde(flatten)]
    pub span: Span,
    pub body: Vec<Statement>,
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleExportName {
    Identifier(Identifier),
    Literal(Literal),
}

impl ModuleExportName {
    pub fn name(&self) -> &str {
        match self {
            ModuleExportName::Identifier(id) => &id.name,
            ModuleExportName::Literal(lit) => match &lit.value {
                LiteralValue::String(s) => s,
                _ => "",
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportDeclaration")]
pub struct ImportDeclaration {
    #[serde(flatten)]
    pub span: Span,
    pub specifiers: Vec<ImportSpecifierKind>,
    pub source: Literal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImportSpecifierKind {
    Named(ImportSpecifier),
    Default(ImportDefaultSpecifier),
    Namespace(ImportNamespaceSpecifier),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportSpecifier")]
pub struct ImportSpecifier {
    #[serde(flatten)]
    pub span: Span,
    pub imported: ModuleExportName,
    pub local: Identifier,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportDefaultSpecifier")]
pub struct ImportDefaultSpecifier {
    #[serde(flatten)]
    pub span: Span,
    pub local: Identifier,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportNamespaceSpecifier")]
pub struct ImportNamespaceSpecifier {
    #[serde(flatten)]
    pub span: Span,
    pub local: Identifier,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportNamedDeclaration")]
pub struct ExportNamedDeclaration {
    #[serde(flatten)]
    pub span: Span,
    pub declaration: Option<Statement>,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Literal>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportSpecifier")]
pub struct ExportSpecifier {
    #[serde(flatten)]
    pub span: Span,
    pub local: ModuleExportName,
    pub exported: ModuleExportName,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportDefaultKind {
    Function(Box<Function>),
    Class(Box<Class>),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportDefaultDeclaration")]
pub struct ExportDefaultDeclaration {
    #[serde(flatten)]
    pub span: Span,
    pub declaration: ExportDefaultKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportAllDeclaration")]
pub struct ExportAllDeclaration {
    #[serde(flatten)]
    pub span: Span,
    pub exported: Option<ModuleExportName>,
    pub source: Literal,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Expression {
    Identifier(Identifier),
    PrivateName(PrivateIdentifier),
    Literal(Literal),
    This(ThisExpression),
    Super(Super),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Function(Box<Function>),
    Arrow(Box<ArrowFunctionExpression>),
    Class(Box<Class>),
    Template(TemplateLiteral),
    TaggedTemplate(Box<TaggedTemplateExpression>),
    Member(Box<MemberExpression>),
    Call(Box<CallExpression>),
    New(Box<NewExpression>),
    Chain(Box<ChainExpression>),
    Spread(Box<SpreadElement>),
    Unary(Box<UnaryExpression>),
    Update(Box<UpdateExpression>),
    Binary(Box<BinaryExpression>),
    Logical(Box<LogicalExpression>),
    Assign(Box<AssignmentExpression>),
    Conditional(Box<ConditionalExpression>),
    Sequence(SequenceExpression),
    Yield(Box<YieldExpression>),
    Await(Box<AwaitExpression>),
    MetaProperty(MetaProperty),
    Import(Box<ImportExpression>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Identifier")]
pub struct Identifier {
    #[serde(flatten)]
    pub span: Span,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "PrivateIdentifier")]
pub struct PrivateIdentifier {
    #[serde(flatten)]
    pub span: Span,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    BigInt,
    RegExp,
}

impl Serialize for LiteralValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LiteralValue::Null | LiteralValue::BigInt | LiteralValue::RegExp => {
                serializer.serialize_none()
            }
            LiteralValue::Boolean(b) => serializer.serialize_bool(*b),
            // Integral values print without a fraction, as JSON.stringify does.
            LiteralValue::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }
            LiteralValue::Number(n) => serializer.serialize_f64(*n),
            LiteralValue::String(s) => serializer.serialize_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegExpValue {
    pub pattern: String,
    pub flags: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Literal")]
pub struct Literal {
    #[serde(flatten)]
    pub span: Span,
    pub value: LiteralValue,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegExpValue>,
    /// Decimal digits of a BigInt literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bigint: Option<String>,
}

impl Literal {
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ThisExpression")]
pub struct ThisExpression {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Super")]
pub struct Super {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ArrayExpression")]
pub struct ArrayExpression {
    #[serde(flatten)]
    pub span: Span,
    pub elements: Vec<Option<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ObjectExpression")]
pub struct ObjectExpression {
    #[serde(flatten)]
    pub span: Span,
    pub properties: Vec<ObjectMember>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectMember {
    Property(Box<Property>),
    Spread(SpreadElement),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Property")]
pub struct Property {
    #[serde(flatten)]
    pub span: Span,
    pub method: bool,
    pub shorthand: bool,
    pub computed: bool,
    pub key: Expression,
    /// For a shorthand with a default (`{a = 1}`, only legal once the object
    /// becomes a pattern) this holds the `a = 1` assignment.
    pub value: Expression,
    pub kind: PropertyKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TemplateLiteral")]
pub struct TemplateLiteral {
    #[serde(flatten)]
    pub span: Span,
    pub expressions: Vec<Expression>,
    pub quasis: Vec<TemplateElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateValue {
    pub raw: String,
    pub cooked: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TemplateElement")]
pub struct TemplateElement {
    #[serde(flatten)]
    pub span: Span,
    pub value: TemplateValue,
    pub tail: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TaggedTemplateExpression")]
pub struct TaggedTemplateExpression {
    #[serde(flatten)]
    pub span: Span,
    pub tag: Expression,
    pub quasi: TemplateLiteral,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "MemberExpression")]
pub struct MemberExpression {
    #[serde(flatten)]
    pub span: Span,
    pub object: Expression,
    pub property: Expression,
    pub computed: bool,
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "CallExpression")]
pub struct CallExpression {
    #[serde(flatten)]
    pub span: Span,
    pub callee: Expression,
    pub arguments: Vec<Expression>,
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "NewExpression")]
pub struct NewExpression {
    #[serde(flatten)]
    pub span: Span,
    pub callee: Expression,
    pub arguments: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ChainExpression")]
pub struct ChainExpression {
    #[serde(flatten)]
    pub span: Span,
    pub expression: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SpreadElement")]
pub struct SpreadElement {
    #[serde(flatten)]
    pub span: Span,
    pub argument: Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "UnaryExpression")]
pub struct UnaryExpression {
    #[serde(flatten)]
    pub span: Span,
    pub operator: UnaryOp,
    pub prefix: bool,
    pub argument: Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "UpdateExpression")]
pub struct UpdateExpression {
    #[serde(flatten)]
    pub span: Span,
    pub operator: UpdateOp,
    pub prefix: bool,
    pub argument: Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Exp,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<<")]
    LShift,
    #[serde(rename = ">>")]
    RShift,
    #[serde(rename = ">>>")]
    URShift,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "BinaryExpression")]
pub struct BinaryExpression {
    #[serde(flatten)]
    pub span: Span,
    pub left: Expression,
    pub operator: BinaryOp,
    pub right: Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    NullishCoalescing,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "LogicalExpression")]
pub struct LogicalExpression {
    #[serde(flatten)]
    pub span: Span,
    pub left: Expression,
    pub operator: LogicalOp,
    pub right: Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    ModAssign,
    #[serde(rename = "**=")]
    ExpAssign,
    #[serde(rename = "<<=")]
    LShiftAssign,
    #[serde(rename = ">>=")]
    RShiftAssign,
    #[serde(rename = ">>>=")]
    URShiftAssign,
    #[serde(rename = "&=")]
    BitAndAssign,
    #[serde(rename = "|=")]
    BitOrAssign,
    #[serde(rename = "^=")]
    BitXorAssign,
    #[serde(rename = "&&=")]
    LogicalAndAssign,
    #[serde(rename = "||=")]
    LogicalOrAssign,
    #[serde(rename = "??=")]
    NullishAssign,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "AssignmentExpression")]
pub struct AssignmentExpression {
    #[serde(flatten)]
    pub span: Span,
    pub operator: AssignOp,
    pub left: Pattern,
    pub right: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ConditionalExpression")]
pub struct ConditionalExpression {
    #[serde(flatten)]
    pub span: Span,
    pub test: Expression,
    pub consequent: Expression,
    pub alternate: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SequenceExpression")]
pub struct SequenceExpression {
    #[serde(flatten)]
    pub span: Span,
    pub expressions: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "YieldExpression")]
pub struct YieldExpression {
    #[serde(flatten)]
    pub span: Span,
    pub delegate: bool,
    pub argument: Option<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "AwaitExpression")]
pub struct AwaitExpression {
    #[serde(flatten)]
    pub span: Span,
    pub argument: Expression,
}

/// `new.target` and `import.meta`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "MetaProperty")]
pub struct MetaProperty {
    #[serde(flatten)]
    pub span: Span,
    pub meta: Identifier,
    pub property: Identifier,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportExpression")]
pub struct ImportExpression {
    #[serde(flatten)]
    pub span: Span,
    pub source: Expression,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Pattern {
    Identifier(Identifier),
    Object(ObjectPattern),
    Array(ArrayPattern),
    Assign(Box<AssignmentPattern>),
    Rest(Box<RestElement>),
    /// Only produced for assignment targets, never for bindings.
    Member(Box<MemberExpression>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ObjectPattern")]
pub struct ObjectPattern {
    #[serde(flatten)]
    pub span: Span,
    pub properties: Vec<ObjectPatternProperty>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectPatternProperty {
    Property(Box<AssignmentProperty>),
    Rest(RestElement),
}

/// A `Property` node whose value is a pattern.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Property")]
pub struct AssignmentProperty {
    #[serde(flatten)]
    pub span: Span,
    pub method: bool,
    pub shorthand: bool,
    pub computed: bool,
    pub key: Expression,
    pub value: Pattern,
    pub kind: PropertyKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ArrayPattern")]
pub struct ArrayPattern {
    #[serde(flatten)]
    pub span: Span,
    pub elements: Vec<Option<Pattern>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "AssignmentPattern")]
pub struct AssignmentPattern {
    #[serde(flatten)]
    pub span: Span,
    pub left: Pattern,
    pub right: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "RestElement")]
pub struct RestElement {
    #[serde(flatten)]
    pub span: Span,
    pub argument: Pattern,
}

// ---------------------------------------------------------------------------
// Span accessors
// ---------------------------------------------------------------------------

macro_rules! impl_span {
    ($ty:ident { $($variant:ident),* $(,)? }) => {
        impl $ty {
            pub fn span(&self) -> Span {
                match self {
                    $( $ty::$variant(node) => node.span, )*
                }
            }
        }
    };
}

impl_span!(Statement {
    Expression, Block, Empty, Debugger, With, Return, Labeled, Break, Continue, If, Switch,
    Throw, Try, While, DoWhile, For, ForIn, ForOf, Function, Variable, Class, Import,
    ExportNamed, ExportDefault, ExportAll,
});

impl_span!(Expression {
    Identifier, PrivateName, Literal, This, Super, Array, Object, Function, Arrow, Class,
    Template, TaggedTemplate, Member, Call, New, Chain, Spread, Unary, Update, Binary, Logical,
    Assign, Conditional, Sequence, Yield, Await, MetaProperty, Import,
});

impl_span!(Pattern { Identifier, Object, Array, Assign, Rest, Member });

impl_span!(ObjectMember { Property, Spread });

impl_span!(ClassElement { Method, Property, StaticBlock });

impl_span!(ModuleExportName { Identifier, Literal });

impl_span!(ImportSpecifierKind { Named, Default, Namespace });

impl_span!(ObjectPatternProperty { Property, Rest });

impl ForLeft {
    pub fn span(&self) -> Span {
        match self {
            ForLeft::Variable(decl) => decl.span,
            ForLeft::Pattern(pat) => pat.span(),
        }
    }
}

impl ArrowBody {
    pub fn span(&self) -> Span {
        match self {
            ArrowBody::Block(block) => block.span,
            ArrowBody::Expression(expr) => expr.span(),
        }
    }
}

impl ExportDefaultKind {
    pub fn span(&self) -> Span {
        match self {
            ExportDefaultKind::Function(func) => func.span,
            ExportDefaultKind::Class(class) => class.span,
            ExportDefaultKind::Expression(expr) => expr.span(),
        }
    }
}
