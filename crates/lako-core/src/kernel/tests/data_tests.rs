use crate::kernel::data::AppData;

#[test]
fn test_app_data_typed_access() {
    let mut data = AppData::new();
    assert!(data.is_empty());

    data.set("answer", 42u32);
    data.set("greeting", String::from("hello"));

    assert_eq!(data.len(), 2);
    assert_eq!(data.get::<u32>("answer"), Some(&42));
    assert_eq!(data.get::<String>("greeting").map(String::as_str), Some("hello"));
    // Wrong type reads as absent
    assert_eq!(data.get::<i64>("answer"), None);

    if let Some(answer) = data.get_mut::<u32>("answer") {
        *answer += 1;
    }
    assert_eq!(data.get::<u32>("answer"), Some(&43));
}

#[test]
fn test_app_data_replace_and_remove() {
    let mut data = AppData::new();
    data.set("slot", 1u8);
    data.set("slot", "now a str");

    assert_eq!(data.len(), 1);
    assert_eq!(data.get::<&str>("slot"), Some(&"now a str"));

    assert_eq!(data.remove::<&str>("slot"), Some("now a str"));
    assert!(!data.contains_key("slot"));
    assert_eq!(data.remove::<u8>("slot"), None);
}
