// In-page scripts used by the dashboard portal
//
// Each constant is a function body run through `UiActuator::evaluate`; inputs
// arrive in `arguments[..]` and selectors are passed as plain CSS strings.

/// Read every record row. Args: row, title, time, status CSS.
/// Returns `[{title, time, status}]`.
pub const LIST_RECORDS: &str = r#"
const [rowCss, titleCss, timeCss, statusCss] = arguments;
const cell = (row, css) => {
  const el = row.querySelector(css);
  return el ? (el.textContent || '').trim() : '';
};
return Array.from(document.querySelectorAll(rowCss)).map(row => ({
  title: cell(row, titleCss),
  time: cell(row, timeCss),
  status: cell(row, statusCss),
}));
"#;

/// Whether the selected topic title equals a name. Args: CSS, name.
pub const IS_CURRENT_TOPIC: &str = r#"
const el = document.querySelector(arguments[0]);
return !!el && (el.textContent || '').trim() === arguments[1];
"#;

/// Whether an expanded folder contains a name. Args: expanded CSS, name.
pub const IS_FOLDER_EXPANDED: &str = r#"
return Array.from(document.querySelectorAll(arguments[0]))
  .some(el => (el.textContent || '').includes(arguments[1]));
"#;

/// Click every expanded folder except the one containing a name.
/// Args: expanded CSS, name. Returns the number collapsed.
pub const COLLAPSE_OTHER_FOLDERS: &str = r#"
let collapsed = 0;
for (const el of Array.from(document.querySelectorAll(arguments[0]))) {
  if ((el.textContent || '').includes(arguments[1])) continue;
  try { el.click(); collapsed++; } catch (e) {}
}
return collapsed;
"#;

/// Click the first element containing a text. Args: CSS, text.
/// Returns whether one was clicked.
pub const CLICK_WITH_TEXT: &str = r#"
const el = Array.from(document.querySelectorAll(arguments[0]))
  .find(el => (el.textContent || '').includes(arguments[1]));
if (!el) return false;
el.click();
return true;
"#;

/// Whether an element containing a text exists. Args: CSS, text.
pub const HAS_ELEMENT_WITH_TEXT: &str = r#"
return Array.from(document.querySelectorAll(arguments[0]))
  .some(el => (el.textContent || '').includes(arguments[1]));
"#;

/// Click the first match. Args: CSS. Returns whether one was found.
pub const CLICK_FIRST: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) return false;
el.click();
return true;
"#;

/// Click the first item containing a text inside any open menu.
/// Args: menu CSS, item CSS, text. Returns whether one was clicked.
pub const CLICK_MENU_ITEM: &str = r#"
const [menuCss, itemCss, text] = arguments;
for (const menu of Array.from(document.querySelectorAll(menuCss))) {
  const item = Array.from(menu.querySelectorAll(itemCss))
    .find(el => (el.textContent || '').includes(text));
  if (item) { item.click(); return true; }
}
return false;
"#;

/// Check the checkbox of selected rows. Args: row CSS, checkbox CSS,
/// row indices. Returns the number of rows checked afterwards.
pub const SELECT_ROWS: &str = r#"
const [rowCss, boxCss, indices] = arguments;
const rows = Array.from(document.querySelectorAll(rowCss));
let checked = 0;
for (const i of indices) {
  const row = rows[i];
  if (!row) continue;
  const box = row.querySelector(boxCss);
  if (!box) continue;
  if (!box.checked) box.click();
  if (box.checked) checked++;
}
return checked;
"#;

/// Scroll to the top of the page.
pub const SCROLL_TOP: &str = "window.scrollTo(0, 0); return true;";
