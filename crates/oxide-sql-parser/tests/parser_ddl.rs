//! Tests for CREATE, DROP, ALTER TABLE and TRUNCATE.

mod common;
use common::*;

use oxide_sql_parser::{DataType, ErrorKind, NodeType, SemanticFlags};

#[test]
fn create_table_with_column_constraints() {
    with_ast(
        "CREATE TABLE users (\
            id INTEGER PRIMARY KEY AUTOINCREMENT, \
            name VARCHAR(100) NOT NULL, \
            email TEXT UNIQUE COLLATE NOCASE, \
            age INT DEFAULT -1 CHECK (age >= -1), \
            team_id BIGINT REFERENCES teams (id) ON DELETE CASCADE\
         )",
        |ast| {
            assert_eq!(ast.node_type(), NodeType::CreateTableStmt);
            assert_eq!(
                child_types(ast, ast.root()),
                vec![
                    NodeType::TableRef,
                    NodeType::ColumnDef,
                    NodeType::ColumnDef,
                    NodeType::ColumnDef,
                    NodeType::ColumnDef,
                    NodeType::ColumnDef,
                ]
            );
            let columns: Vec<_> = ast.children(ast.root())[1..].to_vec();

            let id = columns[0];
            assert_eq!(ast.text(id), Some("id"));
            assert_eq!(ast.node(id).data_type, Some(DataType::Integer));
            let pk = ast.find_child(id, NodeType::PrimaryKeyConstraint).unwrap();
            assert!(ast.node(pk).has(SemanticFlags::AUTOINCREMENT));

            let name = columns[1];
            assert_eq!(
                child_types(ast, name),
                vec![NodeType::TypeName, NodeType::NotNullConstraint]
            );
            let type_name = ast.child(name, 0).unwrap();
            assert_eq!(ast.text(type_name), Some("VARCHAR(100)"));
            assert_eq!(ast.node(name).data_type, Some(DataType::Varchar(Some(100))));

            let collate = ast
                .find_child(columns[2], NodeType::CollateConstraint)
                .unwrap();
            assert_eq!(ast.text(collate), Some("NOCASE"));

            assert_eq!(
                child_types(ast, columns[3]),
                vec![
                    NodeType::TypeName,
                    NodeType::DefaultConstraint,
                    NodeType::CheckConstraint
                ]
            );

            let fk = ast
                .find_child(columns[4], NodeType::ForeignKeyConstraint)
                .unwrap();
            let references = ast.find_child(fk, NodeType::ReferencesClause).unwrap();
            assert_eq!(ast.text(references), Some("teams"));
            assert!(ast.node(references).has(SemanticFlags::CASCADE));
        },
    );
}

#[test]
fn create_table_with_table_constraints() {
    with_ast(
        "CREATE TABLE IF NOT EXISTS memberships (\
            user_id INT, team_id INT, \
            CONSTRAINT pk_membership PRIMARY KEY (user_id, team_id), \
            UNIQUE (team_id) ON CONFLICT REPLACE, \
            CHECK (user_id > 0), \
            FOREIGN KEY (team_id) REFERENCES teams (id) ON UPDATE SET NULL ON DELETE NO ACTION\
         ) WITHOUT ROWID",
        |ast| {
            let root = ast.root_node();
            assert!(root.has(SemanticFlags::IF_NOT_EXISTS));
            assert!(root.has(SemanticFlags::WITHOUT_ROWID));

            let pk = ast
                .find_child(ast.root(), NodeType::PrimaryKeyConstraint)
                .unwrap();
            assert_eq!(ast.text(pk), Some("pk_membership"));
            assert_eq!(child_types(ast, pk), vec![NodeType::ColumnList]);

            let unique = ast
                .find_child(ast.root(), NodeType::UniqueConstraint)
                .unwrap();
            let action = ast.find_child(unique, NodeType::ConflictAction).unwrap();
            assert_eq!(ast.text(action), Some("REPLACE"));

            let fk = ast
                .find_child(ast.root(), NodeType::ForeignKeyConstraint)
                .unwrap();
            assert_eq!(
                child_types(ast, fk),
                vec![NodeType::ColumnList, NodeType::ReferencesClause]
            );
        },
    );
}

#[test]
fn create_temporary_table_as_select() {
    with_ast("CREATE TEMP TABLE recent AS SELECT * FROM events", |ast| {
        assert!(ast.root_node().has(SemanticFlags::TEMPORARY));
        assert_eq!(
            child_types(ast, ast.root()),
            vec![NodeType::TableRef, NodeType::SelectStmt]
        );
    });
}

#[test]
fn columns_without_types() {
    with_ast("CREATE TABLE t (a, b PRIMARY KEY)", |ast| {
        let a = ast.child(ast.root(), 1).unwrap();
        assert_eq!(ast.node(a).child_count(), 0);
        assert_eq!(ast.node(a).data_type, None);
    });
}

#[test]
fn custom_and_multi_word_types() {
    with_ast(
        "CREATE TABLE t (id UUID, ratio DOUBLE PRECISION, code CHARACTER VARYING(8))",
        |ast| {
            let types: Vec<_> = ast.children(ast.root())[1..]
                .iter()
                .map(|&c| ast.node(c).data_type)
                .collect();
            assert_eq!(
                types,
                vec![
                    Some(DataType::Custom),
                    Some(DataType::Double),
                    Some(DataType::Varchar(Some(8)))
                ]
            );
        },
    );
}

#[test]
fn duplicate_column_names_are_rejected() {
    let err = parse_err("CREATE TABLE t (a INT, A TEXT)");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.expected.as_deref(), Some("duplicate-column"));
}

#[test]
fn temporary_and_unique_placement() {
    let _ = parse_err("CREATE TEMP INDEX i ON t (a)");
    let _ = parse_err("CREATE UNIQUE TABLE t (a)");
    let _ = parse_err("CREATE TABLE t (a) WITHOUT KEYS");
}

#[test]
fn create_unique_partial_index() {
    with_ast(
        "CREATE UNIQUE INDEX idx_email ON users (lower(email) DESC, id) WHERE deleted = 0",
        |ast| {
            assert_eq!(ast.node_type(), NodeType::CreateIndexStmt);
            assert!(ast.root_node().has(SemanticFlags::UNIQUE));
            assert_eq!(
                child_types(ast, ast.root()),
                vec![
                    NodeType::ObjectName,
                    NodeType::TableRef,
                    NodeType::IndexedColumn,
                    NodeType::IndexedColumn,
                    NodeType::WhereClause
                ]
            );
            let first = ast.child(ast.root(), 2).unwrap();
            assert!(ast.node(first).has(SemanticFlags::DESCENDING));
            assert_eq!(child_types(ast, first), vec![NodeType::FunctionCall]);
        },
    );
}

#[test]
fn create_view_with_columns() {
    with_ast(
        "CREATE VIEW IF NOT EXISTS active (id, name) AS SELECT id, name FROM users WHERE active",
        |ast| {
            assert_eq!(ast.node_type(), NodeType::CreateViewStmt);
            assert_eq!(
                child_types(ast, ast.root()),
                vec![
                    NodeType::ObjectName,
                    NodeType::ColumnList,
                    NodeType::SelectStmt
                ]
            );
        },
    );
}

#[test]
fn create_trigger() {
    with_ast(
        "CREATE TRIGGER audit AFTER UPDATE OF name, email ON users FOR EACH ROW \
         WHEN new.name <> old.name \
         BEGIN \
           INSERT INTO log (id) VALUES (new.id); \
           UPDATE stats SET changes = changes + 1; \
         END",
        |ast| {
            let root = ast.root_node();
            assert!(root.has(SemanticFlags::AFTER));
            assert!(root.has(SemanticFlags::FOR_EACH_ROW));
            assert_eq!(
                child_types(ast, ast.root()),
                vec![
                    NodeType::ObjectName,
                    NodeType::TriggerEvent,
                    NodeType::TableRef,
                    NodeType::WhenClause,
                    NodeType::TriggerBody
                ]
            );
            let event = path(ast, &[NodeType::TriggerEvent]);
            assert_eq!(ast.text(event), Some("UPDATE"));
            let columns = path(ast, &[NodeType::TriggerEvent, NodeType::ColumnList]);
            assert_eq!(ast.node(columns).child_count(), 2);
            let body = path(ast, &[NodeType::TriggerBody]);
            assert_eq!(
                child_types(ast, body),
                vec![NodeType::InsertStmt, NodeType::UpdateStmt]
            );
        },
    );
}

#[test]
fn instead_of_trigger() {
    with_ast(
        "CREATE TEMP TRIGGER t INSTEAD OF DELETE ON v BEGIN DELETE FROM base WHERE id = old.id; END",
        |ast| {
            let root = ast.root_node();
            assert!(root.has(SemanticFlags::INSTEAD_OF));
            assert!(root.has(SemanticFlags::TEMPORARY));
        },
    );
    let _ = parse_err("CREATE TRIGGER t AFTER INSERT ON x BEGIN SELECT 1 END");
}

#[test]
fn create_schema() {
    with_ast("CREATE SCHEMA IF NOT EXISTS reporting", |ast| {
        assert_eq!(ast.node_type(), NodeType::CreateSchemaStmt);
        let name = path(ast, &[NodeType::ObjectName]);
        assert_eq!(ast.text(name), Some("reporting"));
    });
}

#[test]
fn drop_statements() {
    with_ast("DROP TABLE IF EXISTS a, main.b CASCADE", |ast| {
        assert_eq!(ast.node_type(), NodeType::DropStmt);
        assert_eq!(ast.text(ast.root()), Some("TABLE"));
        let root = ast.root_node();
        assert!(root.has(SemanticFlags::IF_EXISTS));
        assert!(root.has(SemanticFlags::CASCADE));
        let names = ast.children(ast.root());
        assert_eq!(names.len(), 2);
        assert_eq!(ast.schema(names[1]), Some("main"));
    });
    with_ast("DROP INDEX idx RESTRICT", |ast| {
        assert_eq!(ast.text(ast.root()), Some("INDEX"));
        assert!(ast.root_node().has(SemanticFlags::RESTRICT));
    });
    let _ = parse_err("DROP COLUMN a");
}

#[test]
fn alter_table_actions() {
    with_ast("ALTER TABLE users RENAME TO people", |ast| {
        let rename = path(ast, &[NodeType::RenameTable]);
        assert_eq!(ast.text(rename), Some("people"));
    });
    with_ast("ALTER TABLE users RENAME COLUMN name TO full_name", |ast| {
        let rename = path(ast, &[NodeType::RenameColumn]);
        let names: Vec<_> = ast
            .children(rename)
            .into_iter()
            .map(|c| ast.text(c).unwrap())
            .collect();
        assert_eq!(names, ["name", "full_name"]);
    });
    with_ast("ALTER TABLE users ADD COLUMN age INT NOT NULL DEFAULT 0", |ast| {
        let column = path(ast, &[NodeType::AddColumn, NodeType::ColumnDef]);
        assert_eq!(ast.text(column), Some("age"));
        assert_eq!(ast.node(column).child_count(), 3);
    });
    with_ast("ALTER TABLE users DROP age", |ast| {
        let drop = path(ast, &[NodeType::DropColumn]);
        assert_eq!(ast.text(drop), Some("age"));
    });
    let _ = parse_err("ALTER TABLE users MODIFY age");
}

#[test]
fn truncate() {
    for sql in ["TRUNCATE TABLE logs", "TRUNCATE logs"] {
        with_ast(sql, |ast| {
            assert_eq!(ast.node_type(), NodeType::TruncateStmt);
            assert_eq!(ast.text(path(ast, &[NodeType::TableRef])), Some("logs"));
        });
    }
}
