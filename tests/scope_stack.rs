use tinyc::symbol_table::{DataType, SymbolError, SymbolTable, TableState};

fn type_and_level(table: &SymbolTable, name: &str) -> Option<(DataType, u32)> {
    table.lookup(name).map(|e| (e.data_type, e.scope_level))
}

#[test]
fn shadowed_name_is_restored_on_close() {
    let mut table = SymbolTable::new();
    table.insert("x", DataType::Int).unwrap();

    assert_eq!(table.open_scope(), 1);
    table.insert("x", DataType::Float).unwrap();
    assert_eq!(type_and_level(&table, "x"), Some((DataType::Float, 1)));

    table.close_scope().unwrap();
    assert_eq!(type_and_level(&table, "x"), Some((DataType::Int, 0)));
}

#[test]
fn redeclaration_leaves_original_entry() {
    let mut table = SymbolTable::new();
    table.open_scope();
    table.insert("y", DataType::Int).unwrap();

    let err = table.insert("y", DataType::Float).unwrap_err();
    assert!(matches!(err, SymbolError::Redeclaration { ref name, level: 1 } if name == "y"));
    assert_eq!(type_and_level(&table, "y"), Some((DataType::Int, 1)));
    assert_eq!(table.current_scope().unwrap().len(), 1);
}

#[test]
fn close_releases_only_the_top_scope() {
    let mut table = SymbolTable::new();
    table.insert("a", DataType::Int).unwrap();
    table.open_scope();
    table.insert("b", DataType::Char).unwrap();
    table.open_scope();
    table.insert("c", DataType::Float).unwrap();

    table.close_scope().unwrap();
    assert_eq!(type_and_level(&table, "a"), Some((DataType::Int, 0)));
    assert_eq!(type_and_level(&table, "b"), Some((DataType::Char, 1)));
    assert!(table.lookup("c").is_none());
    assert_eq!(table.resolve("c").unwrap_err(), SymbolError::NotFound("c".to_string()));
}

#[test]
fn levels_are_never_reused() {
    let mut table = SymbolTable::new();
    let mut highest = table.current_level().unwrap();

    // Mix of opens and closes, including dropping to the degenerate state
    let pattern = [true, true, false, true, false, false, false, false, true, true, false, true];
    for open in pattern {
        if open {
            let level = table.open_scope();
            assert!(level > highest, "level {} reused after {}", level, highest);
            highest = level;
        } else {
            let _ = table.close_scope();
        }
    }
    assert_eq!(highest, 6);
}

#[test]
fn closing_an_empty_stack_is_not_fatal() {
    let mut table = SymbolTable::new();
    table.close_scope().unwrap();
    assert_eq!(table.state(), TableState::Degenerate);

    assert_eq!(table.close_scope(), Err(SymbolError::NoActiveScope));
    assert_eq!(table.close_scope(), Err(SymbolError::NoActiveScope));
    assert_eq!(table.depth(), 0);

    let level = table.open_scope();
    assert_eq!(level, 1);
    let entry = table.insert("fresh", DataType::Void).unwrap();
    assert_eq!(entry.scope_level, 1);
    assert_eq!(table.state(), TableState::Active);
}

#[test]
fn lookup_prefers_innermost_of_many() {
    let mut table = SymbolTable::new();
    table.insert("v", DataType::Int).unwrap();
    table.open_scope();
    table.insert("w", DataType::Int).unwrap();
    table.open_scope();
    table.insert("v", DataType::Char).unwrap();

    assert_eq!(type_and_level(&table, "v"), Some((DataType::Char, 2)));
    assert_eq!(type_and_level(&table, "w"), Some((DataType::Int, 1)));
    assert!(table.lookup_current_scope("w").is_none());
}
