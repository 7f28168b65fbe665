//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (非空字符串, body 上限范围)，由 `validator` derive 提供
//! - project 仅允许字母、数字、`-`、`_`
//! - dataset / 表名 / 列名仅允许字母、数字、`_`，且不能以数字开头

use ::validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, FeedType, WarehouseConfig};

/// 校验 WarehouseConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &WarehouseConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_project(config)?;
    validate_identifiers(config)?;
    Ok(())
}

/// 字段级约束
fn validate_fields(config: &WarehouseConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, "")
            .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 按字段路径排序后取第一个违规项，保证错误信息稳定
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    return Some((path, describe(err)));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn describe(err: &ValidationError) -> String {
    match &err.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' constraint", err.code),
    }
}

/// 校验 project
fn validate_project(config: &WarehouseConfig) -> Result<(), ContractError> {
    let project = &config.warehouse.project;
    if !project
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ContractError::config_validation(
            "warehouse.project",
            format!("invalid project id '{project}'"),
        ));
    }
    Ok(())
}

/// 校验 dataset / 表名 / 时间列
fn validate_identifiers(config: &WarehouseConfig) -> Result<(), ContractError> {
    check_identifier("warehouse.dataset", &config.warehouse.dataset)?;
    check_identifier(
        "warehouse.timestamp_column",
        &config.warehouse.timestamp_column,
    )?;
    for feed in FeedType::ALL {
        check_identifier(
            &format!("tables.{}", feed.as_str()),
            config.tables.table_for(feed),
        )?;
    }
    Ok(())
}

fn check_identifier(field: &str, value: &str) -> Result<(), ContractError> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(ContractError::config_validation(
            field,
            format!("'{value}' is not a valid identifier"),
        ));
    }
    Ok(())
}
