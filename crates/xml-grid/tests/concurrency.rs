/*
 * concurrency.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * One reader shared by many threads reading several types and column
 * orders at once.
 */

#![cfg(feature = "derive")]

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use xml_grid::{ColumnSignature, GridReader, GridRow};

#[derive(Debug, Default, Clone, PartialEq, GridRow)]
#[grid(rename_all = "PascalCase")]
struct Book {
    title: String,
    number_of_pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, GridRow)]
struct Point(i64, i64);

fn books_xml(count: u32, reversed: bool) -> String {
    let mut xml = String::from("<Books>");
    for i in 0..count {
        if reversed {
            xml.push_str(&format!("<B><NumberOfPages>{i}</NumberOfPages><Title>t{i}</Title></B>"));
        } else {
            xml.push_str(&format!("<B><Title>t{i}</Title><NumberOfPages>{i}</NumberOfPages></B>"));
        }
    }
    xml.push_str("</Books>");
    xml
}

fn expected_books(count: u32) -> Vec<Book> {
    (0..count)
        .map(|i| Book {
            title: format!("t{i}"),
            number_of_pages: i,
        })
        .collect()
}

#[test]
fn test_shared_reader_across_threads() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("xml_grid=trace")
        .with_test_writer()
        .try_init();

    let reader = Arc::new(GridReader::new());
    let handles: Vec<_> = (0..16)
        .map(|n| {
            let reader = Arc::clone(&reader);
            thread::spawn(move || {
                for _ in 0..20 {
                    let books: Vec<Book> = reader.read(&books_xml(50, n % 2 == 0)).unwrap();
                    assert_eq!(books, expected_books(50));

                    let points: Vec<Point> = reader
                        .read(&format!("<P><R><X>{n}</X><Y>{}</Y></R></P>", -n))
                        .unwrap();
                    assert_eq!(points, vec![Point(n, -n)]);

                    let names: Vec<String> = reader.read("<N><R><V>x</V></R></N>").unwrap();
                    assert_eq!(names, vec!["x".to_string()]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let cache = reader.cache();
    assert_eq!(cache.type_count(), 3);
    assert_eq!(cache.signature_count::<Book>(), 2);
    assert!(cache.contains::<Book>(&ColumnSignature::new(["Title", "NumberOfPages"])));
    assert!(cache.contains::<Book>(&ColumnSignature::new(["NumberOfPages", "Title"])));
    assert_eq!(cache.signature_count::<Point>(), 1);
    assert_eq!(cache.signature_count::<String>(), 1);
}

#[test]
fn test_global_reader_is_shared() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let xml = format!("<P><R><A>{i}</A><B>{i}</B></R></P>");
                xml_grid::read::<Point>(&xml).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let i = i as i64;
        assert_eq!(handle.join().unwrap(), vec![Point(i, i)]);
    }
    assert!(
        GridReader::global()
            .cache()
            .contains::<Point>(&ColumnSignature::new(["A", "B"]))
    );
}
