//! `createElement`-equivalent construction helpers (§6 "Element factory").

use fabricate_core::{ComponentFn, Element, ElementType, Props, PropValue};

/// The marker type passed where JSX would write `<>...</>`.
pub struct Fragment;

pub fn create_element(element_type: ElementType, mut props: Props, children: Vec<Element>) -> Element {
    let key = props.shift_remove("key").and_then(|v| v.as_str().map(str::to_string));
    Element { element_type, props, children, key }
}

pub fn tag(name: impl Into<String>, props: Props, children: Vec<Element>) -> Element {
    create_element(ElementType::Tag(name.into()), props, children)
}

pub fn fragment(children: Vec<Element>) -> Element {
    create_element(ElementType::Fragment, Props::new(), children)
}

pub fn component(name: &'static str, render: impl Fn(Props) -> Element + 'static, props: Props) -> Element {
    create_element(ElementType::Component(ComponentFn::new(name, render)), props, Vec::new())
}

/// Single-child transform variant (`jsx`), for call sites that already know there is exactly one
/// child or none.
pub fn jsx(element_type: ElementType, props: Props, child: Option<Element>) -> Element {
    create_element(element_type, props, child.into_iter().collect())
}

/// Multi-child variant (`jsxs`).
pub fn jsxs(element_type: ElementType, props: Props, children: Vec<Element>) -> Element {
    create_element(element_type, props, children)
}

/// Dev-mode variant (`jsxDEV`); source-location metadata is not tracked in this runtime, so this
/// is just an alias of [`jsx`].
pub fn jsx_dev(element_type: ElementType, props: Props, child: Option<Element>) -> Element {
    jsx(element_type, props, child)
}
