/*!
# Support Information Site

A small web site presenting statistics, news, case summaries and
user-submitted reviews about digital sex crime victim support, backed by
spreadsheet and CSV files instead of a database.

## Architecture

### Tabular Data Layer
- **tabular**: loads an `.xlsx` sheet or a CP949 CSV file into a column-oriented
  dataset, with typed load errors collapsed into a fallback at each call site
- **datasets**: the named sources of the site and their built-in fallbacks
- **charts**: per-view column/row offsets that turn a dataset into chart arrays

### Review Store
- **reviews**: review records, the `ReviewRepository` capability and the
  mutex-guarded workbook implementation
- **saving**: reading and rewriting the review workbook
- **password**: Argon2 hashing of deletion passwords

### Web Layer (feature `web`)
- **app**: shared state, routing and the server loop
- **pages**: read-only page handlers
- **templates**: Handlebars templates compiled into the binary

## Routes

- `/`, `/news`, `/cases`, `/resources`, `/about`, `/statistics` - pages
- `/reviews` - review list, newest first
- `/reviews/add` - append a review, redirect back to the list
- `/reviews/delete/{id}` - password-gated delete, JSON result
- `/debug` - filesystem report
- `/static/...` - static assets
*/

pub mod app;
pub mod charts;
pub mod config;
pub mod datasets;
pub mod pages;
pub mod password;
pub mod reviews;
pub mod saving;
pub mod tabular;
pub mod templates;
