//! Abstract syntax tree for Malin
//!
//! The tree is a set of closed sum types. Declarations are stamped with ids
//! (`ClassId`, `FunId`, `VarId`) during decoration; expression nodes carry
//! back-links to the declarations they resolve to plus a result type that
//! stays `LangType::Invalid` until decoration fills it in.

use crate::lexer::{SrcLocationRange, TokenKind};
use std::fmt;

/// Identity of a class declaration (index into `Root::classes` and the
/// decorator's class table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub usize);

/// Identity of a function signature in the decorator's function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunId(pub usize);

/// Identity of a variable-like declaration (global, local, parameter,
/// class member or the synthesised `this`) in the decorator's var table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub usize);

/// What a name in scope refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclId {
    Var(VarId),
    Function(FunId),
    Class(ClassId),
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    I32,
    F32,
    Void,
    Bool,
    Str,
}

impl BuiltinType {
    pub fn from_type_name(name: &str) -> Option<BuiltinType> {
        match name {
            "i32" => Some(BuiltinType::I32),
            "f32" => Some(BuiltinType::F32),
            "void" => Some(BuiltinType::Void),
            "bool" => Some(BuiltinType::Bool),
            "str" => Some(BuiltinType::Str),
            _ => None,
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuiltinType::I32 => "i32",
            BuiltinType::F32 => "f32",
            BuiltinType::Void => "void",
            BuiltinType::Bool => "bool",
            BuiltinType::Str => "str",
        };
        write!(f, "{}", name)
    }
}

/// A language-level type. Structural equality; class identity is by
/// declaration (`ClassId`), not by name.
///
/// `Reference` is declared but never constructed by the current surface
/// language.
#[derive(Debug, Clone, PartialEq)]
pub enum LangType {
    Invalid,
    Builtin(BuiltinType),
    Class(ClassId),
    Reference(Box<LangType>),
}

impl LangType {
    pub fn is_invalid(&self) -> bool {
        matches!(self, LangType::Invalid)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, LangType::Builtin(BuiltinType::Void))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LangType::Builtin(BuiltinType::I32) | LangType::Builtin(BuiltinType::F32)
        )
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, LangType::Builtin(BuiltinType::Bool))
    }

    pub fn is_class(&self) -> bool {
        matches!(self, LangType::Class(_))
    }

    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            LangType::Class(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_builtin(&self) -> Option<BuiltinType> {
        match self {
            LangType::Builtin(b) => Some(*b),
            _ => None,
        }
    }
}

/// Binary operators. The numeric value of each operator is its precedence
/// for the climbing parser; higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogicOr,
    LogicAnd,
    Equals,
    NotEquals,
    GreaterThen,
    GreaterEqualThen,
    LessThen,
    LessEqualThen,
    Plus,
    Minus,
    Divide,
    Multiply,
}

impl BinaryOp {
    pub fn precedence(&self) -> u32 {
        match self {
            BinaryOp::LogicOr => 5,
            BinaryOp::LogicAnd => 10,
            BinaryOp::Equals => 20,
            BinaryOp::NotEquals => 25,
            BinaryOp::GreaterThen => 30,
            BinaryOp::GreaterEqualThen => 35,
            BinaryOp::LessThen => 40,
            BinaryOp::LessEqualThen => 45,
            BinaryOp::Plus => 50,
            BinaryOp::Minus => 60,
            BinaryOp::Divide => 70,
            BinaryOp::Multiply => 80,
        }
    }

    pub fn from_token(kind: TokenKind) -> Option<BinaryOp> {
        match kind {
            TokenKind::OperatorLogicOr => Some(BinaryOp::LogicOr),
            TokenKind::OperatorLogicAnd => Some(BinaryOp::LogicAnd),
            TokenKind::OperatorEquals => Some(BinaryOp::Equals),
            TokenKind::OperatorNotEquals => Some(BinaryOp::NotEquals),
            TokenKind::OperatorGreaterThen => Some(BinaryOp::GreaterThen),
            TokenKind::OperatorGreaterEqualThen => Some(BinaryOp::GreaterEqualThen),
            TokenKind::OperatorLessThen => Some(BinaryOp::LessThen),
            TokenKind::OperatorLessEqualThen => Some(BinaryOp::LessEqualThen),
            TokenKind::OperatorPlus => Some(BinaryOp::Plus),
            TokenKind::OperatorMinus => Some(BinaryOp::Minus),
            TokenKind::OperatorDivide => Some(BinaryOp::Divide),
            TokenKind::OperatorMultiply => Some(BinaryOp::Multiply),
            _ => None,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equals
                | BinaryOp::NotEquals
                | BinaryOp::GreaterThen
                | BinaryOp::GreaterEqualThen
                | BinaryOp::LessThen
                | BinaryOp::LessEqualThen
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Divide | BinaryOp::Multiply
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicOr | BinaryOp::LogicAnd)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::LogicOr => "||",
            BinaryOp::LogicAnd => "&&",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::GreaterThen => ">",
            BinaryOp::GreaterEqualThen => ">=",
            BinaryOp::LessThen => "<",
            BinaryOp::LessEqualThen => "<=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Divide => "/",
            BinaryOp::Multiply => "*",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    LogicNot,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::LogicNot => write!(f, "!"),
        }
    }
}

// ============================================================================
//                              Expressions
// ============================================================================

/// An expression node: kind plus source range plus the result type the
/// decorator fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub location: SrcLocationRange,
    pub result_type: LangType,
}

impl Expression {
    pub fn new(kind: ExprKind, location: SrcLocationRange) -> Self {
        Expression {
            kind,
            location,
            result_type: LangType::Invalid,
        }
    }

    /// True for literal nodes, the only constant expressions of the
    /// language.
    pub fn is_const_expr(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::IntLiteral(_)
                | ExprKind::FloatLiteral(_)
                | ExprKind::BoolLiteral(_)
                | ExprKind::StringLiteral(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLiteral(i32),
    FloatLiteral(f32),
    BoolLiteral(bool),
    StringLiteral(String),
    Variable(VariableExpr),
    MemberVariable(MemberVariableExpr),
    Call(CallExpr),
    MemberCall(MemberCallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    pub name: String,
    pub resolved: Option<VarId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberVariableExpr {
    pub parent: Box<Expression>,
    pub name: String,
    pub resolved: Option<VarId>,
}

/// One argument at a call site. `name` is set for named arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub name: Option<String>,
    pub expression: Expression,
    pub location: SrcLocationRange,
}

/// A call. After decoration `args` holds exactly one argument per callee
/// parameter, in parameter order, and `named_args` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<CallArg>,
    pub named_args: Vec<CallArg>,
    pub resolved: Option<FunId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberCallExpr {
    pub parent: Box<Expression>,
    pub call: CallExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub inner: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
}

// ============================================================================
//                              Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Compound(CompoundStmt),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    Assign(AssignStmt),
    Let(VariableDecl),
    Expr(Expression),
}

impl Statement {
    pub fn location(&self) -> SrcLocationRange {
        match self {
            Statement::Compound(s) => s.location,
            Statement::Return(s) => s.location,
            Statement::If(s) => s.location,
            Statement::While(s) => s.location,
            Statement::Assign(s) => s.location,
            Statement::Let(s) => s.location,
            Statement::Expr(e) => e.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStmt {
    pub statements: Vec<Statement>,
    pub location: SrcLocationRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub expression: Option<Expression>,
    pub location: SrcLocationRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_body: CompoundStmt,
    pub else_body: Option<CompoundStmt>,
    pub location: SrcLocationRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: CompoundStmt,
    pub location: SrcLocationRange,
}

/// `target = value;` where the target is a variable or member-variable
/// expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Expression,
    pub value: Expression,
    pub location: SrcLocationRange,
}

// ============================================================================
//                              Declarations
// ============================================================================

/// A variable declaration: a global or local `let`, or a class member.
///
/// Either a declared type name or an init expression is present (or both);
/// `let` declarations always have an init expression, members always have a
/// declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub type_name: Option<String>,
    pub init: Option<Expression>,
    pub location: SrcLocationRange,
    /// filled by decoration
    pub var_id: Option<VarId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParamDecl {
    pub name: String,
    pub type_name: String,
    /// default value, restricted to constant expressions by the parser
    pub default: Option<Expression>,
    pub location: SrcLocationRange,
    /// filled by decoration
    pub var_id: Option<VarId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    /// declared return type name; "void" when the declaration has none
    pub return_type_name: String,
    pub params: Vec<FunctionParamDecl>,
    /// absent iff `extern`
    pub body: Option<CompoundStmt>,
    pub is_extern: bool,
    pub location: SrcLocationRange,
    /// filled by decoration
    pub fun_id: Option<FunId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub members: Vec<VariableDecl>,
    pub methods: Vec<FunctionDecl>,
    pub location: SrcLocationRange,
}

/// The root of a parsed file: ordered class, global-variable and function
/// declarations. After decoration `main_function` is set exactly when a
/// function named `main` with no parameters and return type `i32` exists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Root {
    pub classes: Vec<ClassDecl>,
    pub globals: Vec<VariableDecl>,
    pub functions: Vec<FunctionDecl>,
    pub main_function: Option<FunId>,
    pub location: Option<SrcLocationRange>,
}

impl Root {
    pub fn find_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_from_type_name() {
        assert_eq!(BuiltinType::from_type_name("i32"), Some(BuiltinType::I32));
        assert_eq!(BuiltinType::from_type_name("f32"), Some(BuiltinType::F32));
        assert_eq!(BuiltinType::from_type_name("bool"), Some(BuiltinType::Bool));
        assert_eq!(BuiltinType::from_type_name("str"), Some(BuiltinType::Str));
        assert_eq!(BuiltinType::from_type_name("void"), Some(BuiltinType::Void));
        assert_eq!(BuiltinType::from_type_name("MyClass"), None);
    }

    #[test]
    fn test_lang_type_equality_is_structural() {
        assert_eq!(
            LangType::Builtin(BuiltinType::I32),
            LangType::Builtin(BuiltinType::I32)
        );
        assert_ne!(
            LangType::Builtin(BuiltinType::I32),
            LangType::Builtin(BuiltinType::F32)
        );
        assert_eq!(LangType::Class(ClassId(1)), LangType::Class(ClassId(1)));
        assert_ne!(LangType::Class(ClassId(1)), LangType::Class(ClassId(2)));
        assert_eq!(
            LangType::Reference(Box::new(LangType::Builtin(BuiltinType::Bool))),
            LangType::Reference(Box::new(LangType::Builtin(BuiltinType::Bool)))
        );
    }

    #[test]
    fn test_precedence_table() {
        // the table from the language definition, higher binds tighter
        assert!(BinaryOp::Multiply.precedence() > BinaryOp::Divide.precedence());
        assert!(BinaryOp::Divide.precedence() > BinaryOp::Minus.precedence());
        assert!(BinaryOp::Minus.precedence() > BinaryOp::Plus.precedence());
        assert!(BinaryOp::Plus.precedence() > BinaryOp::LessEqualThen.precedence());
        assert!(BinaryOp::Equals.precedence() > BinaryOp::LogicAnd.precedence());
        assert!(BinaryOp::LogicAnd.precedence() > BinaryOp::LogicOr.precedence());
    }

    #[test]
    fn test_const_expr_detection() {
        let loc = SrcLocationRange::at(crate::lexer::SrcLocation::new(1, 1, 0));
        assert!(Expression::new(ExprKind::IntLiteral(1), loc).is_const_expr());
        assert!(Expression::new(ExprKind::BoolLiteral(true), loc).is_const_expr());
        let var = Expression::new(
            ExprKind::Variable(VariableExpr {
                name: "x".to_string(),
                resolved: None,
            }),
            loc,
        );
        assert!(!var.is_const_expr());
    }
}
