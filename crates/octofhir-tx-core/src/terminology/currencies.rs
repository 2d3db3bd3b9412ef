//! ISO 4217 alphabetic currency codes.

use super::CodeValidation;

/// Active ISO 4217 codes, including the fund codes and precious metals (`X..`).
const CODES: &[(&str, &str)] = &[
    ("AED", "United Arab Emirates dirham"),
    ("AFN", "Afghan afghani"),
    ("ALL", "Albanian lek"),
    ("AMD", "Armenian dram"),
    ("ANG", "Netherlands Antillean guilder"),
    ("AOA", "Angolan kwanza"),
    ("ARS", "Argentine peso"),
    ("AUD", "Australian dollar"),
    ("AWG", "Aruban florin"),
    ("AZN", "Azerbaijani manat"),
    ("BAM", "Bosnia and Herzegovina convertible mark"),
    ("BBD", "Barbados dollar"),
    ("BDT", "Bangladeshi taka"),
    ("BGN", "Bulgarian lev"),
    ("BHD", "Bahraini dinar"),
    ("BIF", "Burundian franc"),
    ("BMD", "Bermudian dollar"),
    ("BND", "Brunei dollar"),
    ("BOB", "Boliviano"),
    ("BOV", "Bolivian Mvdol"),
    ("BRL", "Brazilian real"),
    ("BSD", "Bahamian dollar"),
    ("BTN", "Bhutanese ngultrum"),
    ("BWP", "Botswana pula"),
    ("BYN", "Belarusian ruble"),
    ("BZD", "Belize dollar"),
    ("CAD", "Canadian dollar"),
    ("CDF", "Congolese franc"),
    ("CHE", "WIR Euro"),
    ("CHF", "Swiss franc"),
    ("CHW", "WIR Franc"),
    ("CLF", "Unidad de Fomento"),
    ("CLP", "Chilean peso"),
    ("CNY", "Renminbi (Chinese) yuan"),
    ("COP", "Colombian peso"),
    ("COU", "Unidad de Valor Real"),
    ("CRC", "Costa Rican colon"),
    ("CUC", "Cuban convertible peso"),
    ("CUP", "Cuban peso"),
    ("CVE", "Cape Verde escudo"),
    ("CZK", "Czech koruna"),
    ("DJF", "Djiboutian franc"),
    ("DKK", "Danish krone"),
    ("DOP", "Dominican peso"),
    ("DZD", "Algerian dinar"),
    ("EGP", "Egyptian pound"),
    ("ERN", "Eritrean nakfa"),
    ("ETB", "Ethiopian birr"),
    ("EUR", "Euro"),
    ("FJD", "Fiji dollar"),
    ("FKP", "Falkland Islands pound"),
    ("GBP", "Pound sterling"),
    ("GEL", "Georgian lari"),
    ("GGP", "Guernsey Pound"),
    ("GHS", "Ghanaian cedi"),
    ("GIP", "Gibraltar pound"),
    ("GMD", "Gambian dalasi"),
    ("GNF", "Guinean franc"),
    ("GTQ", "Guatemalan quetzal"),
    ("GYD", "Guyanese dollar"),
    ("HKD", "Hong Kong dollar"),
    ("HNL", "Honduran lempira"),
    ("HRK", "Croatian kuna"),
    ("HTG", "Haitian gourde"),
    ("HUF", "Hungarian forint"),
    ("IDR", "Indonesian rupiah"),
    ("ILS", "Israeli new shekel"),
    ("IMP", "Isle of Man Pound"),
    ("INR", "Indian rupee"),
    ("IQD", "Iraqi dinar"),
    ("IRR", "Iranian rial"),
    ("ISK", "Icelandic krona"),
    ("JEP", "Jersey Pound"),
    ("JMD", "Jamaican dollar"),
    ("JOD", "Jordanian dinar"),
    ("JPY", "Japanese yen"),
    ("KES", "Kenyan shilling"),
    ("KGS", "Kyrgyzstani som"),
    ("KHR", "Cambodian riel"),
    ("KMF", "Comoro franc"),
    ("KPW", "North Korean won"),
    ("KRW", "South Korean won"),
    ("KWD", "Kuwaiti dinar"),
    ("KYD", "Cayman Islands dollar"),
    ("KZT", "Kazakhstani tenge"),
    ("LAK", "Lao kip"),
    ("LBP", "Lebanese pound"),
    ("LKR", "Sri Lankan rupee"),
    ("LRD", "Liberian dollar"),
    ("LSL", "Lesotho loti"),
    ("LYD", "Libyan dinar"),
    ("MAD", "Moroccan dirham"),
    ("MDL", "Moldovan leu"),
    ("MGA", "Malagasy ariary"),
    ("MKD", "Macedonian denar"),
    ("MMK", "Myanmar kyat"),
    ("MNT", "Mongolian togrog"),
    ("MOP", "Macanese pataca"),
    ("MRU", "Mauritanian ouguiya"),
    ("MUR", "Mauritian rupee"),
    ("MVR", "Maldivian rufiyaa"),
    ("MWK", "Malawian kwacha"),
    ("MXN", "Mexican peso"),
    ("MXV", "Mexican Unidad de Inversion"),
    ("MYR", "Malaysian ringgit"),
    ("MZN", "Mozambican metical"),
    ("NAD", "Namibian dollar"),
    ("NGN", "Nigerian naira"),
    ("NIO", "Nicaraguan cordoba"),
    ("NOK", "Norwegian krone"),
    ("NPR", "Nepalese rupee"),
    ("NZD", "New Zealand dollar"),
    ("OMR", "Omani rial"),
    ("PAB", "Panamanian balboa"),
    ("PEN", "Peruvian Sol"),
    ("PGK", "Papua New Guinean kina"),
    ("PHP", "Philippine piso"),
    ("PKR", "Pakistani rupee"),
    ("PLN", "Polish zloty"),
    ("PYG", "Paraguayan guarani"),
    ("QAR", "Qatari riyal"),
    ("RON", "Romanian leu"),
    ("RSD", "Serbian dinar"),
    ("RUB", "Russian ruble"),
    ("RWF", "Rwandan franc"),
    ("SAR", "Saudi riyal"),
    ("SBD", "Solomon Islands dollar"),
    ("SCR", "Seychelles rupee"),
    ("SDG", "Sudanese pound"),
    ("SEK", "Swedish krona/kronor"),
    ("SGD", "Singapore dollar"),
    ("SHP", "Saint Helena pound"),
    ("SLL", "Sierra Leonean leone"),
    ("SOS", "Somali shilling"),
    ("SRD", "Surinamese dollar"),
    ("SSP", "South Sudanese pound"),
    ("STN", "Sao Tome and Principe dobra"),
    ("SVC", "Salvadoran colon"),
    ("SYP", "Syrian pound"),
    ("SZL", "Swazi lilangeni"),
    ("THB", "Thai baht"),
    ("TJS", "Tajikistani somoni"),
    ("TMT", "Turkmenistan manat"),
    ("TND", "Tunisian dinar"),
    ("TOP", "Tongan pa'anga"),
    ("TRY", "Turkish lira"),
    ("TTD", "Trinidad and Tobago dollar"),
    ("TVD", "Tuvalu Dollar"),
    ("TWD", "New Taiwan dollar"),
    ("TZS", "Tanzanian shilling"),
    ("UAH", "Ukrainian hryvnia"),
    ("UGX", "Ugandan shilling"),
    ("USD", "United States dollar"),
    ("USN", "United States dollar (next day)"),
    ("UYI", "Uruguay Peso en Unidades Indexadas"),
    ("UYU", "Uruguayan peso"),
    ("UZS", "Uzbekistan som"),
    ("VEF", "Venezuelan bolivar"),
    ("VND", "Vietnamese dong"),
    ("VUV", "Vanuatu vatu"),
    ("WST", "Samoan tala"),
    ("XAF", "CFA franc BEAC"),
    ("XAG", "Silver"),
    ("XAU", "Gold"),
    ("XBA", "European Composite Unit"),
    ("XBB", "European Monetary Unit"),
    ("XBC", "European Unit of Account 9"),
    ("XBD", "European Unit of Account 17"),
    ("XCD", "East Caribbean dollar"),
    ("XDR", "Special drawing rights"),
    ("XOF", "CFA franc BCEAO"),
    ("XPD", "Palladium"),
    ("XPF", "CFP franc"),
    ("XPT", "Platinum"),
    ("XSU", "SUCRE"),
    ("XTS", "Code reserved for testing purposes"),
    ("XUA", "ADB Unit of Account"),
    ("XXX", "No currency"),
    ("YER", "Yemeni rial"),
    ("ZAR", "South African rand"),
    ("ZMW", "Zambian kwacha"),
    ("ZWL", "Zimbabwean dollar"),
];

pub(super) fn validate(code: &str) -> CodeValidation {
    match CODES.iter().find(|(c, _)| *c == code) {
        Some((_, name)) => CodeValidation::valid_with(*name),
        None => CodeValidation::invalid(format!("Unknown ISO 4217 currency code '{code}'")),
    }
}
