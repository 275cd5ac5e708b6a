//! Typed AST produced by the SOQL parser.
//!
//! Every node here is an owned value (`Clone + Debug + PartialEq`) — the
//! tree is built in one pass and borrows nothing from the source text or
//! the token stream once construction returns. Where the source grammar
//! would tag a node with a dynamic `type` string, this module instead uses
//! a sealed sum type (`FieldType`); serialization boundaries (the optional
//! `serde` feature) are the only place a `type` discriminant string is
//! synthesized, via `#[serde(tag = "type")]`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Top-level parsed query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Query {
    pub fields: Vec<FieldType>,
    pub s_object: String,
    pub s_object_alias: Option<String>,
    pub s_object_prefix: Option<Vec<String>>,
    pub using_scope: Option<UsingScope>,
    pub r#where: Option<Condition>,
    pub with_security_enforced: Option<bool>,
    pub with_data_category: Option<WithDataCategory>,
    pub group_by: Option<GroupByClause>,
    pub order_by: Vec<OrderByClause>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub r#for: Option<ForClause>,
    pub update: Option<UpdateClause>,
}

/// A nested relationship query, e.g. `(SELECT Id FROM Contacts)`.
///
/// Structurally identical to [`Query`] except the root-object concept is
/// replaced by the relationship traversed from the outer object, and a
/// subquery never carries `using_scope`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Subquery {
    pub fields: Vec<FieldType>,
    pub relationship_name: String,
    pub s_object_prefix: Option<Vec<String>>,
    pub s_object_alias: Option<String>,
    pub r#where: Option<Condition>,
    pub with_security_enforced: Option<bool>,
    pub with_data_category: Option<WithDataCategory>,
    pub group_by: Option<GroupByClause>,
    pub order_by: Vec<OrderByClause>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub r#for: Option<ForClause>,
    pub update: Option<UpdateClause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ForClause {
    View,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum UpdateClause {
    Tracking,
    Viewstat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UsingScope {
    Delegated,
    Everything,
    Mine,
    MineAndMyGroups,
    MyTerritory,
    MyTeamTerritory,
    Team,
}

impl UsingScope {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "delegated" => Some(Self::Delegated),
            "everything" => Some(Self::Everything),
            "mine" => Some(Self::Mine),
            "mine_and_my_groups" => Some(Self::MineAndMyGroups),
            "my_territory" => Some(Self::MyTerritory),
            "my_team_territory" => Some(Self::MyTeamTerritory),
            "team" => Some(Self::Team),
            _ => None,
        }
    }
}

/// A projected field — a sealed sum type standing in for the source
/// grammar's dynamically tagged `type` string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum FieldType {
    Field(Field),
    FieldRelationship(FieldRelationship),
    FieldFunctionExpression(FieldFunctionExpression),
    FieldSubquery(FieldSubquery),
    FieldTypeof(FieldTypeof),
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Field {
    pub field: String,
    pub object_prefix: Option<String>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldRelationship {
    pub field: String,
    pub relationships: Vec<String>,
    pub object_prefix: Option<String>,
    pub alias: Option<String>,
    pub raw_value: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldFunctionExpression {
    pub function_name: String,
    pub parameters: Vec<FunctionParameter>,
    pub is_aggregate_fn: Option<bool>,
    pub alias: Option<String>,
    pub raw_value: String,
}

/// An argument to a function call: either a plain field/literal token or a
/// nested function call (e.g. `GEOLOCATION(...)` inside `DISTANCE(...)`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FunctionParameter {
    Value(String),
    Function(Box<FieldFunctionExpression>),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldSubquery {
    pub subquery: Subquery,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldTypeof {
    pub field: String,
    pub conditions: Vec<TypeofCondition>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum TypeofCondition {
    #[cfg_attr(feature = "serde", serde(rename = "WHEN"))]
    When {
        object_type: String,
        field_list: Vec<String>,
    },
    #[cfg_attr(feature = "serde", serde(rename = "ELSE"))]
    Else { field_list: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RelationalOperator {
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Equal,
    #[cfg_attr(feature = "serde", serde(rename = "!="))]
    NotEqual,
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    LessThan,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    LessOrEqual,
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    GreaterThan,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    GreaterOrEqual,
    #[cfg_attr(feature = "serde", serde(rename = "LIKE"))]
    Like,
    #[cfg_attr(feature = "serde", serde(rename = "IN"))]
    In,
    #[cfg_attr(feature = "serde", serde(rename = "NOT IN"))]
    NotIn,
    #[cfg_attr(feature = "serde", serde(rename = "INCLUDES"))]
    Includes,
    #[cfg_attr(feature = "serde", serde(rename = "EXCLUDES"))]
    Excludes,
}

impl RelationalOperator {
    /// True for the set-membership operators, whose RHS is an array.
    pub fn is_set_operator(self) -> bool {
        matches!(
            self,
            RelationalOperator::In
                | RelationalOperator::NotIn
                | RelationalOperator::Includes
                | RelationalOperator::Excludes
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LogicalOperator {
    #[cfg_attr(feature = "serde", serde(rename = "AND"))]
    And,
    #[cfg_attr(feature = "serde", serde(rename = "OR"))]
    Or,
}

/// One tag of [`LiteralType`], or several for a heterogeneous array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum LiteralTypeTag {
    Scalar(LiteralType),
    Array(Vec<LiteralType>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LiteralType {
    #[cfg_attr(feature = "serde", serde(rename = "STRING"))]
    String,
    #[cfg_attr(feature = "serde", serde(rename = "INTEGER"))]
    Integer,
    #[cfg_attr(feature = "serde", serde(rename = "DECIMAL"))]
    Decimal,
    #[cfg_attr(feature = "serde", serde(rename = "INTEGER_WITH_CURRENCY_PREFIX"))]
    IntegerWithCurrencyPrefix,
    #[cfg_attr(feature = "serde", serde(rename = "DECIMAL_WITH_CURRENCY_PREFIX"))]
    DecimalWithCurrencyPrefix,
    #[cfg_attr(feature = "serde", serde(rename = "BOOLEAN"))]
    Boolean,
    #[cfg_attr(feature = "serde", serde(rename = "DATE"))]
    Date,
    #[cfg_attr(feature = "serde", serde(rename = "DATETIME"))]
    DateTime,
    #[cfg_attr(feature = "serde", serde(rename = "NULL"))]
    Null,
    #[cfg_attr(feature = "serde", serde(rename = "DATE_LITERAL"))]
    DateLiteral,
    #[cfg_attr(feature = "serde", serde(rename = "DATE_N_LITERAL"))]
    DateNLiteral,
    #[cfg_attr(feature = "serde", serde(rename = "APEX_BIND_VARIABLE"))]
    ApexBindVariable,
    #[cfg_attr(feature = "serde", serde(rename = "SUBQUERY"))]
    Subquery,
}

/// One node in the left-linked WHERE/HAVING expression chain. `right`
/// links to the next node; `logical_operator` is the connective joining
/// this node to `right` when present.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Condition {
    pub field: Option<String>,
    pub fn_: Option<FieldFunctionExpression>,
    pub operator: RelationalOperator,
    pub value: Option<String>,
    pub value_query: Option<Box<Subquery>>,
    pub literal_type: Option<LiteralTypeTag>,
    pub date_literal_variable: Option<DateLiteralVariable>,
    pub logical_prefix: Option<LogicalPrefix>,
    pub open_paren: u32,
    pub close_paren: u32,
    pub logical_operator: Option<LogicalOperator>,
    pub right: Option<Box<Condition>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LogicalPrefix {
    #[cfg_attr(feature = "serde", serde(rename = "NOT"))]
    Not,
}

/// Either a single date-N variable (`LAST_N_DAYS:7` -> `7`) or, for an
/// array RHS, one slot per element (`None` where the element isn't a
/// date-N literal).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DateLiteralVariable {
    Single(i64),
    PerElement(Vec<Option<i64>>),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum GroupByField {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct GroupByClause {
    pub field: Option<GroupByField>,
    pub fn_: Option<FieldFunctionExpression>,
    pub having: Option<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderDirection {
    #[cfg_attr(feature = "serde", serde(rename = "ASC"))]
    Asc,
    #[cfg_attr(feature = "serde", serde(rename = "DESC"))]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NullsOrder {
    #[cfg_attr(feature = "serde", serde(rename = "FIRST"))]
    First,
    #[cfg_attr(feature = "serde", serde(rename = "LAST"))]
    Last,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OrderByClause {
    pub field: Option<String>,
    pub fn_: Option<FieldFunctionExpression>,
    pub order: Option<OrderDirection>,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataCategorySelector {
    At,
    Above,
    Below,
    AboveOrBelow,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WithDataCategoryCondition {
    pub group_name: String,
    pub selector: DataCategorySelector,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WithDataCategory {
    pub conditions: Vec<WithDataCategoryCondition>,
}

impl Field {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Default::default()
        }
    }
}
