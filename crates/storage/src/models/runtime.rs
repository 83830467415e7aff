use sqlx::{FromRow, SqliteConnection};


/// Sentinel recorded in the type catalog for types without a decoder.
pub const DECODER_NOT_IMPLEMENTED: &str = "[not implemented]";


/// One runtime metadata snapshot, immutable once written.
#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeRow {
    pub spec_version: u32,
    pub spec_name: String,
    pub impl_name: String,
    pub impl_version: u32,
    pub authoring_version: u32,
    pub metadata_version: u32,
    pub apis: String,
    /// Raw `state_getMetadata` bytes, hex.
    pub raw_metadata: String,
    pub metadata_decoded: String,
    pub count_modules: u32,
    pub count_call_functions: u32,
    pub count_events: u32,
    pub count_storage_functions: u32,
    pub count_constants: u32,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeModuleRow {
    pub spec_version: u32,
    pub module_id: String,
    pub name: String,
    pub prefix: String,
    pub count_call_functions: u32,
    pub count_events: u32,
    pub count_storage_functions: u32,
    pub count_constants: u32,
    pub count_errors: u32,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeCallRow {
    pub spec_version: u32,
    pub module_id: String,
    pub call_id: String,
    pub call_idx: u32,
    pub lookup: String,
    pub name: String,
    pub documentation: String,
    pub count_params: u32,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeCallParamRow {
    pub spec_version: u32,
    pub module_id: String,
    pub call_id: String,
    pub param_idx: u32,
    pub name: String,
    #[sqlx(rename = "type")]
    pub param_type: String,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeEventRow {
    pub spec_version: u32,
    pub module_id: String,
    pub event_id: String,
    pub event_idx: u32,
    pub lookup: String,
    pub name: String,
    pub documentation: String,
    pub count_attributes: u32,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeEventAttributeRow {
    pub spec_version: u32,
    pub module_id: String,
    pub event_id: String,
    pub attribute_idx: u32,
    #[sqlx(rename = "type")]
    pub attribute_type: String,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeStorageRow {
    pub spec_version: u32,
    pub module_id: String,
    pub name: String,
    pub modifier: String,
    pub type_hasher: Option<String>,
    pub type_key1: Option<String>,
    pub type_key2: Option<String>,
    pub type_value: String,
    pub type_is_linked: bool,
    pub type_key2hasher: Option<String>,
    /// Default value bytes, hex.
    pub default_value: String,
    pub documentation: String,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeConstantRow {
    pub spec_version: u32,
    pub module_id: String,
    pub name: String,
    #[sqlx(rename = "type")]
    pub constant_type: String,
    /// Decoded JSON, or the raw hex when decoding was not possible.
    pub value: String,
    pub value_raw: String,
    pub documentation: String,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct RuntimeTypeRow {
    pub spec_version: u32,
    pub type_string: String,
    pub decoder_class: String,
}


pub async fn insert_runtime(
    conn: &mut SqliteConnection,
    runtime: &RuntimeRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtimes (
            spec_version, spec_name, impl_name, impl_version, authoring_version,
            metadata_version, apis, raw_metadata, metadata_decoded, count_modules,
            count_call_functions, count_events, count_storage_functions, count_constants
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(runtime.spec_version)
    .bind(&runtime.spec_name)
    .bind(&runtime.impl_name)
    .bind(runtime.impl_version)
    .bind(runtime.authoring_version)
    .bind(runtime.metadata_version)
    .bind(&runtime.apis)
    .bind(&runtime.raw_metadata)
    .bind(&runtime.metadata_decoded)
    .bind(runtime.count_modules)
    .bind(runtime.count_call_functions)
    .bind(runtime.count_events)
    .bind(runtime.count_storage_functions)
    .bind(runtime.count_constants)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn runtime_by_spec_version(
    conn: &mut SqliteConnection,
    spec_version: u32,
) -> Result<Option<RuntimeRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM runtimes WHERE spec_version = ?")
        .bind(spec_version)
        .fetch_optional(conn)
        .await
}


pub async fn insert_runtime_module(
    conn: &mut SqliteConnection,
    module: &RuntimeModuleRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_modules (
            spec_version, module_id, name, prefix, count_call_functions,
            count_events, count_storage_functions, count_constants, count_errors
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(module.spec_version)
    .bind(&module.module_id)
    .bind(&module.name)
    .bind(&module.prefix)
    .bind(module.count_call_functions)
    .bind(module.count_events)
    .bind(module.count_storage_functions)
    .bind(module.count_constants)
    .bind(module.count_errors)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn runtime_module_ids(
    conn: &mut SqliteConnection,
    spec_version: u32,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT module_id FROM runtime_modules WHERE spec_version = ?")
        .bind(spec_version)
        .fetch_all(conn)
        .await
}


pub async fn insert_runtime_call(
    conn: &mut SqliteConnection,
    call: &RuntimeCallRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_calls (
            spec_version, module_id, call_id, call_idx, lookup, name,
            documentation, count_params
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(call.spec_version)
    .bind(&call.module_id)
    .bind(&call.call_id)
    .bind(call.call_idx)
    .bind(&call.lookup)
    .bind(&call.name)
    .bind(&call.documentation)
    .bind(call.count_params)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn insert_runtime_call_param(
    conn: &mut SqliteConnection,
    param: &RuntimeCallParamRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_call_params (
            spec_version, module_id, call_id, param_idx, name, type
        ) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(param.spec_version)
    .bind(&param.module_id)
    .bind(&param.call_id)
    .bind(param.param_idx)
    .bind(&param.name)
    .bind(&param.param_type)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn insert_runtime_event(
    conn: &mut SqliteConnection,
    event: &RuntimeEventRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_events (
            spec_version, module_id, event_id, event_idx, lookup, name,
            documentation, count_attributes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event.spec_version)
    .bind(&event.module_id)
    .bind(&event.event_id)
    .bind(event.event_idx)
    .bind(&event.lookup)
    .bind(&event.name)
    .bind(&event.documentation)
    .bind(event.count_attributes)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn insert_runtime_event_attribute(
    conn: &mut SqliteConnection,
    attribute: &RuntimeEventAttributeRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_event_attributes (
            spec_version, module_id, event_id, attribute_idx, type
        ) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(attribute.spec_version)
    .bind(&attribute.module_id)
    .bind(&attribute.event_id)
    .bind(attribute.attribute_idx)
    .bind(&attribute.attribute_type)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn insert_runtime_storage(
    conn: &mut SqliteConnection,
    storage: &RuntimeStorageRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_storage (
            spec_version, module_id, name, modifier, type_hasher, type_key1,
            type_key2, type_value, type_is_linked, type_key2hasher,
            default_value, documentation
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(storage.spec_version)
    .bind(&storage.module_id)
    .bind(&storage.name)
    .bind(&storage.modifier)
    .bind(&storage.type_hasher)
    .bind(&storage.type_key1)
    .bind(&storage.type_key2)
    .bind(&storage.type_value)
    .bind(storage.type_is_linked)
    .bind(&storage.type_key2hasher)
    .bind(&storage.default_value)
    .bind(&storage.documentation)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn insert_runtime_constant(
    conn: &mut SqliteConnection,
    constant: &RuntimeConstantRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_constants (
            spec_version, module_id, name, type, value, value_raw, documentation
        ) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(constant.spec_version)
    .bind(&constant.module_id)
    .bind(&constant.name)
    .bind(&constant.constant_type)
    .bind(&constant.value)
    .bind(&constant.value_raw)
    .bind(&constant.documentation)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn insert_runtime_type(
    conn: &mut SqliteConnection,
    row: &RuntimeTypeRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO runtime_types (spec_version, type_string, decoder_class)
         VALUES (?, ?, ?)",
    )
    .bind(row.spec_version)
    .bind(&row.type_string)
    .bind(&row.decoder_class)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn runtime_type_exists(
    conn: &mut SqliteConnection,
    spec_version: u32,
    type_string: &str,
) -> Result<bool, sqlx::Error> {
    let row: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM runtime_types WHERE spec_version = ? AND type_string = ?",
    )
    .bind(spec_version)
    .bind(type_string)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}


pub async fn runtime_types_by_spec_version(
    conn: &mut SqliteConnection,
    spec_version: u32,
) -> Result<Vec<RuntimeTypeRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM runtime_types WHERE spec_version = ? ORDER BY type_string",
    )
    .bind(spec_version)
    .fetch_all(conn)
    .await
}
