use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, html};
use numfmt::{Formatter, Precision};

pub const HTMX_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/htmx.org@2.0.8/dist/htmx.min.js";
pub const TAILWIND_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4";
pub const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

// Form styles
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

/// The page skeleton shared by every page.
///
/// `scripts` are URLs of extra JavaScript files to load in the head, before
/// any inline scripts in `content` run.
pub fn base(title: &str, scripts: &[&str], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - E-Commerce Dashboard" }

                script src=(TAILWIND_SCRIPT_URL) {}
                script src=(HTMX_SCRIPT_URL) {}

                style
                {
                    r#"
                    #indicator.htmx-indicator {
                        display: none;
                    }

                    #indicator.htmx-request.htmx-indicator {
                        display: inline;
                    }
                    "#
                }

                @for script in scripts
                {
                    script src=(script) {}
                }
            }

            body class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    // Template adapted from https://flowbite.com/blocks/marketing/404/
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p
                        class="mb-4 text-1xl md:text-2xl tracking-tight
                            text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a
                        href="/"
                        class="inline-flex text-white bg-blue-600
                            hover:bg-blue-800 focus:ring-4 focus:outline-hidden
                            focus:ring-blue-300 font-medium rounded text-sm px-5
                            py-2.5 text-center dark:focus:ring-blue-900 my-4"
                    {
                        "Back to Dashboard"
                    }
                }
            }
        }
    );

    base(title, &[], &content)
}

/// Formats `number` rounded to a whole number with thousands separators, e.g. "12,345".
pub fn format_count(number: f64) -> String {
    static COUNT_FMT: OnceLock<Formatter> = OnceLock::new();

    let count_fmt = COUNT_FMT.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    count_fmt.fmt_string(number.round())
}
