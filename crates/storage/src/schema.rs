use sqlx::SqlitePool;


/// Creates every table and index the harvester writes to.
///
/// Bootstrap only: statements are idempotent and there is no migration
/// machinery, a fresh column set means a fresh database.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}


const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS blocks (
        id INTEGER PRIMARY KEY,
        parent_id INTEGER,
        hash TEXT NOT NULL UNIQUE,
        parent_hash TEXT NOT NULL,
        state_root TEXT NOT NULL,
        extrinsics_root TEXT NOT NULL,
        count_extrinsics INTEGER NOT NULL,
        count_extrinsics_unsigned INTEGER NOT NULL,
        count_extrinsics_signed INTEGER NOT NULL,
        count_extrinsics_error INTEGER NOT NULL,
        count_extrinsics_success INTEGER NOT NULL,
        count_extrinsics_signedby_address INTEGER NOT NULL,
        count_extrinsics_signedby_index INTEGER NOT NULL,
        count_events INTEGER NOT NULL,
        count_events_system INTEGER NOT NULL,
        count_events_module INTEGER NOT NULL,
        count_events_extrinsic INTEGER NOT NULL,
        count_events_finalization INTEGER NOT NULL,
        count_accounts INTEGER NOT NULL,
        count_accounts_new INTEGER NOT NULL,
        count_accounts_reaped INTEGER NOT NULL,
        count_sessions_new INTEGER NOT NULL,
        count_contracts_new INTEGER NOT NULL,
        count_log INTEGER NOT NULL,
        range10000 INTEGER NOT NULL,
        range100000 INTEGER NOT NULL,
        range1000000 INTEGER NOT NULL,
        datetime INTEGER,
        slot_number INTEGER,
        account_index INTEGER,
        spec_version_id INTEGER NOT NULL,
        logs TEXT NOT NULL,
        debug_info TEXT
    )",
    "CREATE TABLE IF NOT EXISTS extrinsics (
        block_id INTEGER NOT NULL,
        extrinsic_idx INTEGER NOT NULL,
        extrinsic_hash TEXT,
        extrinsic_length INTEGER NOT NULL,
        extrinsic_version INTEGER NOT NULL,
        signed INTEGER NOT NULL,
        unsigned INTEGER NOT NULL,
        signedby_address INTEGER NOT NULL,
        signedby_index INTEGER NOT NULL,
        address_length INTEGER,
        address TEXT,
        account_index INTEGER,
        signature TEXT,
        nonce INTEGER,
        era TEXT,
        call TEXT NOT NULL,
        module_id TEXT NOT NULL,
        call_id TEXT NOT NULL,
        params TEXT NOT NULL,
        success INTEGER NOT NULL,
        error INTEGER NOT NULL,
        spec_version_id INTEGER NOT NULL,
        codec_error INTEGER NOT NULL,
        PRIMARY KEY (block_id, extrinsic_idx)
    )",
    "CREATE TABLE IF NOT EXISTS events (
        block_id INTEGER NOT NULL,
        event_idx INTEGER NOT NULL,
        phase INTEGER NOT NULL,
        extrinsic_idx INTEGER,
        type TEXT NOT NULL,
        module_id TEXT NOT NULL,
        event_id TEXT NOT NULL,
        system INTEGER NOT NULL,
        module INTEGER NOT NULL,
        attributes TEXT NOT NULL,
        spec_version_id INTEGER NOT NULL,
        codec_error INTEGER NOT NULL,
        PRIMARY KEY (block_id, event_idx)
    )",
    "CREATE TABLE IF NOT EXISTS transfers (
        block_id INTEGER NOT NULL,
        extrinsic_idx INTEGER NOT NULL,
        data_extrinsic_idx TEXT NOT NULL,
        transfer_from TEXT NOT NULL,
        from_raw TEXT NOT NULL,
        transfer_to TEXT NOT NULL,
        to_raw TEXT NOT NULL,
        hash TEXT,
        amount TEXT NOT NULL,
        module_id TEXT NOT NULL,
        success INTEGER NOT NULL,
        error INTEGER NOT NULL,
        block_timestamp INTEGER,
        PRIMARY KEY (block_id, extrinsic_idx)
    )",
    "CREATE INDEX IF NOT EXISTS ix_transfers_from ON transfers (transfer_from)",
    "CREATE INDEX IF NOT EXISTS ix_transfers_to ON transfers (transfer_to)",
    "CREATE INDEX IF NOT EXISTS ix_transfers_hash ON transfers (hash)",
    "CREATE INDEX IF NOT EXISTS ix_transfers_timestamp ON transfers (block_timestamp)",
    "CREATE INDEX IF NOT EXISTS ix_transfers_module ON transfers (module_id)",
    "CREATE INDEX IF NOT EXISTS ix_transfers_success ON transfers (success)",
    "CREATE INDEX IF NOT EXISTS ix_transfers_error ON transfers (error)",
    "CREATE TABLE IF NOT EXISTS logs (
        block_id INTEGER NOT NULL,
        log_idx INTEGER NOT NULL,
        type_id INTEGER NOT NULL,
        type TEXT NOT NULL,
        data TEXT NOT NULL,
        PRIMARY KEY (block_id, log_idx)
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS runtimes (
        spec_version INTEGER PRIMARY KEY,
        spec_name TEXT NOT NULL,
        impl_name TEXT NOT NULL,
        impl_version INTEGER NOT NULL,
        authoring_version INTEGER NOT NULL,
        metadata_version INTEGER NOT NULL,
        apis TEXT NOT NULL,
        raw_metadata TEXT NOT NULL,
        metadata_decoded TEXT NOT NULL,
        count_modules INTEGER NOT NULL,
        count_call_functions INTEGER NOT NULL,
        count_events INTEGER NOT NULL,
        count_storage_functions INTEGER NOT NULL,
        count_constants INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS runtime_modules (
        spec_version INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        name TEXT NOT NULL,
        prefix TEXT NOT NULL,
        count_call_functions INTEGER NOT NULL,
        count_events INTEGER NOT NULL,
        count_storage_functions INTEGER NOT NULL,
        count_constants INTEGER NOT NULL,
        count_errors INTEGER NOT NULL,
        PRIMARY KEY (spec_version, module_id)
    )",
    "CREATE TABLE IF NOT EXISTS runtime_calls (
        spec_version INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        call_id TEXT NOT NULL,
        call_idx INTEGER NOT NULL,
        lookup TEXT NOT NULL,
        name TEXT NOT NULL,
        documentation TEXT NOT NULL,
        count_params INTEGER NOT NULL,
        PRIMARY KEY (spec_version, module_id, call_id)
    )",
    "CREATE TABLE IF NOT EXISTS runtime_call_params (
        spec_version INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        call_id TEXT NOT NULL,
        param_idx INTEGER NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        PRIMARY KEY (spec_version, module_id, call_id, param_idx)
    )",
    "CREATE TABLE IF NOT EXISTS runtime_events (
        spec_version INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        event_id TEXT NOT NULL,
        event_idx INTEGER NOT NULL,
        lookup TEXT NOT NULL,
        name TEXT NOT NULL,
        documentation TEXT NOT NULL,
        count_attributes INTEGER NOT NULL,
        PRIMARY KEY (spec_version, module_id, event_id)
    )",
    "CREATE TABLE IF NOT EXISTS runtime_event_attributes (
        spec_version INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        event_id TEXT NOT NULL,
        attribute_idx INTEGER NOT NULL,
        type TEXT NOT NULL,
        PRIMARY KEY (spec_version, module_id, event_id, attribute_idx)
    )",
    "CREATE TABLE IF NOT EXISTS runtime_storage (
        spec_version INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        name TEXT NOT NULL,
        modifier TEXT NOT NULL,
        type_hasher TEXT,
        type_key1 TEXT,
        type_key2 TEXT,
        type_value TEXT NOT NULL,
        type_is_linked INTEGER NOT NULL,
        type_key2hasher TEXT,
        default_value TEXT NOT NULL,
        documentation TEXT NOT NULL,
        PRIMARY KEY (spec_version, module_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS runtime_constants (
        spec_version INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        value TEXT NOT NULL,
        value_raw TEXT NOT NULL,
        documentation TEXT NOT NULL,
        PRIMARY KEY (spec_version, module_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS runtime_types (
        spec_version INTEGER NOT NULL,
        type_string TEXT NOT NULL,
        decoder_class TEXT NOT NULL,
        PRIMARY KEY (spec_version, type_string)
    )",
    "CREATE TABLE IF NOT EXISTS block_totals (
        id INTEGER PRIMARY KEY,
        parent_datetime INTEGER,
        blocktime INTEGER NOT NULL,
        total_extrinsics INTEGER NOT NULL,
        total_extrinsics_success INTEGER NOT NULL,
        total_extrinsics_error INTEGER NOT NULL,
        total_extrinsics_signed INTEGER NOT NULL,
        total_extrinsics_unsigned INTEGER NOT NULL,
        total_extrinsics_signedby_address INTEGER NOT NULL,
        total_extrinsics_signedby_index INTEGER NOT NULL,
        total_events INTEGER NOT NULL,
        total_events_system INTEGER NOT NULL,
        total_events_module INTEGER NOT NULL,
        total_events_extrinsic INTEGER NOT NULL,
        total_events_finalization INTEGER NOT NULL,
        total_blocktime INTEGER NOT NULL,
        total_accounts INTEGER NOT NULL,
        total_accounts_new INTEGER NOT NULL,
        total_accounts_reaped INTEGER NOT NULL,
        total_sessions_new INTEGER NOT NULL,
        total_contracts_new INTEGER NOT NULL,
        total_logs INTEGER NOT NULL,
        total_transfers INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS account_audits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id TEXT NOT NULL,
        block_id INTEGER NOT NULL,
        extrinsic_idx INTEGER,
        event_idx INTEGER,
        type_id INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS ix_account_audits_account ON account_audits (account_id)",
    "CREATE INDEX IF NOT EXISTS ix_account_audits_block ON account_audits (block_id)",
    "CREATE TABLE IF NOT EXISTS account_index_audits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_index INTEGER NOT NULL,
        account_id TEXT,
        block_id INTEGER NOT NULL,
        extrinsic_idx INTEGER,
        event_idx INTEGER,
        type_id INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS ix_account_index_audits_index ON account_index_audits (account_index)",
    "CREATE INDEX IF NOT EXISTS ix_account_index_audits_block ON account_index_audits (block_id)",
];
