//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `brandbook_core` linkage.
//! - Exercise one create/upsert/list cycle against an in-memory database.

use brandbook_core::{
    GuardedStore, PersonaFields, PersonaStore, Principal, RecordStore, RepoError,
};
use uuid::Uuid;

fn main() {
    println!("brandbook_core version={}", brandbook_core::core_version());
    match smoke() {
        Ok(count) => println!("brandbook_core smoke=ok personas={count}"),
        Err(err) => {
            eprintln!("brandbook_core smoke=error kind={:?} error={err}", err.kind());
            std::process::exit(1);
        }
    }
}

fn smoke() -> Result<u64, RepoError> {
    let mut conn = brandbook_core::open_db_in_memory()?;
    let mut personas = GuardedStore::new(PersonaStore::new(&mut conn));
    let owner = Principal::new(Uuid::new_v4());

    let created = personas.create(
        owner,
        PersonaFields {
            name: Some("Ava".to_string()),
            age: Some(30),
            ..PersonaFields::default()
        },
    )?;
    if let Some(sequence_id) = created.sequence_id {
        personas.upsert(
            owner,
            sequence_id,
            PersonaFields {
                age: Some(31),
                ..PersonaFields::default()
            },
        )?;
    }

    personas.into_inner().count_by_owner(owner.id())
}
